use error::{BuilderError, Result};
use io::Read;
use primitive::Primitive;
use types::{SOffset, UOffset, VOffset, MAX_BUFFER_SIZE, SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VOFFSET};

/// Count of metadata fields at the head of every vtable: its own byte-size and the
/// described object's byte-size.
const VTABLE_METADATA_FIELDS: usize = 2;

/// `Builder` assembles one or more FlatBuffers-compatible buffers.
///
/// Typically a `Builder` is driven by code generated by a schema compiler, but the state
/// machine below is exactly what such generated code is allowed to call: `start_object`,
/// `prepend`/`prepend_slot`, `prepend_uoffset_relative_slot`, `prepend_struct_slot`,
/// `end_object`, `start_vector`/`end_vector`, `create_string`, `finish`.
///
/// A `Builder` constructs byte buffers in a last-first manner for simplicity and
/// performance during reading: objects are written back-to-front, so a finished object's
/// children are always already-written bytes at higher addresses by the time the object
/// itself is serialized.
///
/// Internally, a `Builder` is a state machine for creating FlatBuffer objects. It holds:
/// `buf`, the backing byte buffer; `current_vtable`, the in-progress object's field
/// offsets (`None` when no object is open); and `vtables`, the list of every previously
/// finalized vtable, used to deduplicate structurally identical ones.
pub struct Builder {
    buf: Vec<u8>,
    head: usize,
    minalign: usize,
    current_vtable: Option<Vec<usize>>,
    object_end: usize,
    vtables: Vec<usize>,
}

impl Builder {
    /// Initializes a Builder with a buffer of `initial_size` bytes. The buffer grows as needed.
    pub fn new(initial_size: usize) -> Result<Builder> {
        if initial_size > MAX_BUFFER_SIZE {
            return Err(BuilderError::BuilderSize(MAX_BUFFER_SIZE));
        }

        Ok(Builder {
            buf: vec![0u8; initial_size],
            head: initial_size,
            minalign: 1,
            current_vtable: None,
            object_end: 0,
            vtables: Vec::new(),
        })
    }

    /// Returns the portion of the buffer that has been written, as an owned copy.
    pub fn output(&self) -> Vec<u8> {
        self.buf[self.head..].to_vec()
    }

    /// Returns the portion of the buffer that has been written, borrowed.
    pub fn finished_data(&self) -> &[u8] {
        &self.buf[self.head..]
    }

    /// Truncates the underlying buffer, allowing allocation-free reuse of this Builder.
    /// Existing capacity is retained.
    pub fn reset(&mut self) {
        self.vtables.clear();
        self.current_vtable = None;
        self.head = self.buf.len();
        self.minalign = 1;
        self.object_end = 0;
    }

    /// The current write position, expressed as a distance from the tail of the buffer.
    /// Stable across `grow_byte_buffer` calls, unlike an absolute index into `buf`.
    pub fn offset(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Places `n` zero bytes immediately before `head`, decrementing `head` by `n`.
    pub fn pad(&mut self, n: usize) {
        for b in &mut self.buf[self.head - n..self.head] {
            *b = 0;
        }
        self.head -= n;
    }

    /// Prepares to write an element of `size` bytes after `additional` trailing bytes have
    /// been written, e.g. when writing a string, the length field must align such that the
    /// string data that follows it lands right after. If all that's needed is alignment,
    /// `additional` is 0.
    pub fn prep(&mut self, size: usize, additional: usize) -> Result<()> {
        if size > self.minalign {
            self.minalign = size;
        }

        // Padding needed so `size` lands aligned after `additional` more bytes are written,
        // computed via the two's-complement trick since `size` is always a power of two.
        let align_size = (self.buf.len() - self.head + additional).wrapping_neg() & (size - 1);
        let total_size = align_size + size + additional;

        if self.head < total_size {
            self.grow_byte_buffer(total_size)?;
        }
        self.head -= align_size;
        Ok(())
    }

    /// Doubles the buffer, copying the old content towards the end of the new buffer (since
    /// the buffer is built backwards). Every existing Offset-from-tail remains valid.
    fn grow_byte_buffer(&mut self, demand: usize) -> Result<()> {
        let old_size = self.buf.len();
        let new_size = std::cmp::max(1024, std::cmp::max(old_size * 2, old_size + demand - self.head));
        if new_size >= MAX_BUFFER_SIZE {
            return Err(BuilderError::BuilderSize(MAX_BUFFER_SIZE));
        }

        let mut new_buf = vec![0u8; new_size];
        new_buf[new_size - old_size..].copy_from_slice(&self.buf);
        self.head += new_size - old_size;
        self.buf = new_buf;
        Ok(())
    }

    fn assert_not_nested(&self) -> Result<()> {
        if self.current_vtable.is_some() {
            return Err(BuilderError::ObjectIsNested);
        }
        Ok(())
    }

    /// Initializes bookkeeping for writing a new object with `numfields` schema field slots.
    pub fn start_object(&mut self, numfields: usize) -> Result<()> {
        self.assert_not_nested()?;
        self.current_vtable = Some(vec![0usize; numfields]);
        self.object_end = self.offset();
        self.minalign = 1;
        Ok(())
    }

    /// Records the vtable slot `slotnum` as pointing at the most recently written field value.
    pub fn slot(&mut self, slotnum: usize) -> Result<()> {
        let offset = self.offset();
        match &mut self.current_vtable {
            Some(vtable) => {
                vtable[slotnum] = offset;
                Ok(())
            }
            None => Err(BuilderError::NotInObject),
        }
    }

    /// Finishes writing the currently open object, serializing (or deduplicating) its vtable.
    pub fn end_object(&mut self) -> Result<usize> {
        if self.current_vtable.is_none() {
            return Err(BuilderError::NotInObject);
        }
        self.write_vtable()
    }

    /// Serializes the vtable for the current object, if an identical one doesn't already exist.
    ///
    /// Before writing out the vtable, this checks pre-existing vtables for structural equality
    /// to this one. If an equal vtable is found, the object is pointed at the existing vtable
    /// instead of writing a duplicate.
    ///
    /// An object has the layout `<SOffset: offset to this object's vtable (may be negative)>
    /// <byte: data>+`. A vtable has the layout `<VOffset: size of the vtable in bytes, including
    /// this value> <VOffset: size of the object in bytes, including the vtable offset>
    /// <VOffset: offset for a field> * N`.
    fn write_vtable(&mut self) -> Result<usize> {
        // Reserve the object's leading SOffset; its real value is filled in below.
        self.prepend_soffset_relative(0)?;

        let object_offset = self.offset();
        let current_vtable = self.current_vtable.take().unwrap();
        let mut existing_vtable = None;

        // Search backwards through existing vtables, since similar vtables are likely to
        // have been appended recently; this heuristic saves a large share of the time spent
        // writing objects with duplicate vtables, at the cost of occasionally missing an
        // older structural match.
        for &vt_offset in self.vtables.iter().rev() {
            let vt_start = self.buf.len() - vt_offset;
            let vt_len = <VOffset as Read>::read(&self.buf, vt_start) as usize;
            let metadata = VTABLE_METADATA_FIELDS * SIZE_VOFFSET;
            let vt_end = vt_start + vt_len;
            let field_region = &self.buf[vt_start + metadata..vt_end];

            if vtable_equal(&current_vtable, object_offset, field_region) {
                existing_vtable = Some(vt_offset);
                break;
            }
        }

        match existing_vtable {
            Some(vt_offset) => {
                self.head = self.buf.len() - object_offset;
                let delta = vt_offset as i64 - object_offset as i64;
                (delta as SOffset).write_le(&mut self.buf, self.head);
            }
            None => {
                // Write the new vtable in reverse, since serialization happens last-first.
                for &e in current_vtable.iter().rev() {
                    let voff: VOffset = if e == 0 {
                        0
                    } else {
                        (object_offset - e) as VOffset
                    };
                    self.prepend(voff)?;
                }

                self.prepend((object_offset - self.object_end) as VOffset)?;

                let vtable_bytes = (current_vtable.len() + VTABLE_METADATA_FIELDS) * SIZE_VOFFSET;
                self.prepend(vtable_bytes as VOffset)?;

                let header_pos = self.buf.len() - object_offset;
                let delta = (self.offset() - object_offset) as SOffset;
                delta.write_le(&mut self.buf, header_pos);

                self.vtables.push(self.offset());
            }
        }

        Ok(object_offset)
    }

    /// Prepends an SOffset relative to the position it will be written at.
    ///
    /// Alignment is ensured by the `prep` call here directly rather than going through the
    /// generic `prepend`, since the value written depends on `offset()` as observed right
    /// after alignment but before the value itself is placed.
    pub fn prepend_soffset_relative(&mut self, target_offset: usize) -> Result<usize> {
        self.prep(SIZE_SOFFSET, 0)?;
        let delta = self.checked_offset_delta(target_offset)?;
        self.place((delta + SIZE_SOFFSET) as SOffset);
        Ok(self.offset())
    }

    /// Prepends a UOffset relative to the position it will be written at. Used both for
    /// object-header UOffsets (string/table/vector fields) and for individual elements of a
    /// vector of offsets.
    pub fn prepend_uoffset_relative(&mut self, target_offset: usize) -> Result<usize> {
        self.prep(SIZE_UOFFSET, 0)?;
        let delta = self.checked_offset_delta(target_offset)?;
        self.place((delta + SIZE_UOFFSET) as UOffset);
        Ok(self.offset())
    }

    fn checked_offset_delta(&self, target_offset: usize) -> Result<usize> {
        let cur = self.offset();
        if target_offset > cur {
            return Err(BuilderError::OffsetArithmetic);
        }
        Ok(cur - target_offset)
    }

    /// Initializes bookkeeping for writing a new vector of `num_elems` elements of `elem_size`
    /// bytes each, whose elements require `alignment`-byte alignment.
    ///
    /// A vector has the layout `<UOffset: number of elements> <T: data>+`.
    pub fn start_vector(&mut self, elem_size: usize, num_elems: usize, alignment: usize) -> Result<usize> {
        self.assert_not_nested()?;
        self.prep(SIZE_UOFFSET, elem_size * num_elems)?;
        self.prep(alignment, elem_size * num_elems)?;
        Ok(self.offset())
    }

    /// Writes the element-count field that finishes a vector started with `start_vector`.
    pub fn end_vector(&mut self, num_elems: usize) -> Result<usize> {
        self.place(num_elems as UOffset);
        Ok(self.offset())
    }

    /// Writes a null-terminated byte string as a vector of bytes.
    pub fn create_string(&mut self, s: &[u8]) -> Result<usize> {
        self.assert_not_nested()?;

        let len = s.len();
        self.prep(SIZE_UOFFSET, len + 1)?;
        self.pad(1);

        self.head -= len;
        let start = self.head;
        self.buf[start..start + len].copy_from_slice(s);

        self.end_vector(len)
    }

    /// Writes a UTF-8 string; a thin convenience wrapper over `create_string`.
    pub fn create_str(&mut self, s: &str) -> Result<usize> {
        self.create_string(s.as_bytes())
    }

    /// Finalizes the buffer, pointing the root at `root_offset`.
    pub fn finish(&mut self, root_offset: usize) -> Result<usize> {
        self.prep(self.minalign, SIZE_UOFFSET)?;
        self.prepend_uoffset_relative(root_offset)?;
        Ok(self.head)
    }

    /// Prepends a scalar of any [`Primitive`] kind, after range-checking it.
    pub fn prepend<T: Primitive>(&mut self, value: T) -> Result<()> {
        value.validate()?;
        self.prep(T::WIDTH, 0)?;
        self.place(value);
        Ok(())
    }

    /// Writes `value` directly at `head - WIDTH`, decrementing `head`. The caller must have
    /// already reserved the space (and alignment) via `prep`.
    fn place<T: Primitive>(&mut self, value: T) {
        self.head -= T::WIDTH;
        let pos = self.head;
        value.write_le(&mut self.buf, pos);
    }

    /// Prepends `value` onto the object at vtable slot `slot`, unless it equals `default`, in
    /// which case the slot is left at zero and nothing else is written. This default-elision
    /// is how the format achieves compact, schema-evolution-friendly encoding.
    pub fn prepend_slot<T: Primitive + PartialEq>(&mut self, slot: usize, value: T, default: T) -> Result<()> {
        if value != default {
            self.prepend(value)?;
            self.slot(slot)?;
        }
        Ok(())
    }

    /// Prepends a UOffset onto the object at vtable slot `slot`, unless `target_offset` equals
    /// `default` (conventionally 0, meaning "absent").
    pub fn prepend_uoffset_relative_slot(&mut self, slot: usize, target_offset: usize, default: usize) -> Result<()> {
        if target_offset != default {
            self.prepend_uoffset_relative(target_offset)?;
            self.slot(slot)?;
        }
        Ok(())
    }

    /// Records vtable slot `slot` as pointing at an inline struct, unless `struct_offset`
    /// equals `default` (conventionally 0). Structs are always written inline at the
    /// builder's current offset, so no bytes are emitted here; `struct_offset` must already
    /// equal `offset()` or this fails with `StructIsNotInline`.
    pub fn prepend_struct_slot(&mut self, slot: usize, struct_offset: usize, default: usize) -> Result<()> {
        if struct_offset != default {
            if struct_offset != self.offset() {
                return Err(BuilderError::StructIsNotInline);
            }
            self.slot(slot)?;
        }
        Ok(())
    }
}

/// Compares an unwritten vtable (`current`, as Offset-from-tail per field slot) to an
/// already-written one's field-offset region (`written`, as raw VOffset bytes).
fn vtable_equal(current: &[usize], object_offset: usize, written: &[u8]) -> bool {
    if current.len() * SIZE_VOFFSET != written.len() {
        return false;
    }

    for (i, &elem) in current.iter().enumerate() {
        let x = <VOffset as Read>::read(&written, i * SIZE_VOFFSET);

        if x == 0 && elem == 0 {
            continue;
        }

        let y = (object_offset - elem) as VOffset;
        if x != y {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use table::get_root;

    #[test]
    fn test_minimal_table() {
        let mut b = Builder::new(0).unwrap();
        b.start_object(3).unwrap();
        let obj = b.end_object().unwrap();
        b.finish(obj).unwrap();

        let data = b.output();
        // 4 (root UOffset) + 2 (alignment pad) + 4 (object SOffset) + 10 (3-field vtable).
        assert_eq!(20, data.len());

        let root = get_root(&data[..], 0);
        assert_eq!(10, root.vtable_bytes_len());
        assert_eq!(0, root.field_offset(4));
        assert_eq!(0, root.field_offset(6));
        assert_eq!(0, root.field_offset(8));
    }

    #[test]
    fn test_default_elision() {
        let mut b = Builder::new(0).unwrap();
        b.start_object(1).unwrap();
        b.prepend_slot(0, 42i32, 42i32).unwrap();
        let obj = b.end_object().unwrap();
        b.finish(obj).unwrap();

        let data = b.output();
        let root = get_root(&data[..], 0);
        assert_eq!(42, root.get_slot::<i32>(4, 42));
    }

    #[test]
    fn test_non_default_field() {
        let mut b = Builder::new(0).unwrap();
        b.start_object(1).unwrap();
        b.prepend_slot(0, 7i32, 42i32).unwrap();
        let obj = b.end_object().unwrap();
        b.finish(obj).unwrap();

        let data = b.output();
        let root = get_root(&data[..], 0);
        assert_eq!(7, root.get_slot::<i32>(4, 42));
    }

    #[test]
    fn test_string_field() {
        let mut b = Builder::new(0).unwrap();
        let s = b.create_string(b"hello").unwrap();
        b.start_object(1).unwrap();
        b.prepend_uoffset_relative_slot(0, s, 0).unwrap();
        let obj = b.end_object().unwrap();
        b.finish(obj).unwrap();

        let data = b.output();
        let root = get_root(&data[..], 0);
        let field = root.string_field(4).unwrap();
        assert_eq!("hello", field.as_str());
    }

    #[test]
    fn test_vtable_dedup() {
        let mut b = Builder::new(0).unwrap();

        b.start_object(2).unwrap();
        b.prepend_slot(0, 100i32, 0i32).unwrap();
        b.prepend_slot(1, 5i32, 0i32).unwrap();
        b.end_object().unwrap();

        b.start_object(2).unwrap();
        b.prepend_slot(0, 100i32, 0i32).unwrap();
        b.prepend_slot(1, 5i32, 0i32).unwrap();
        b.end_object().unwrap();

        assert_eq!(1, b.vtables.len());
    }

    #[test]
    fn test_buffer_growth() {
        let mut b = Builder::new(8).unwrap();
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let s = b.create_string(&payload).unwrap();

        assert!(b.buf.len() >= 1024);

        let data = b.output();
        // `s` is an Offset-from-tail; the string's length prefix lives at `len(data) - s`.
        let pos = data.len() - s;
        let len = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        assert_eq!(1000, len);
        assert_eq!(&payload[..], &data[pos + 4..pos + 4 + len]);
        assert_eq!(0, data[pos + 4 + len]);
    }

    #[test]
    fn test_object_is_nested_error() {
        let mut b = Builder::new(0).unwrap();
        b.start_object(1).unwrap();
        assert_eq!(Err(BuilderError::ObjectIsNested), b.start_object(1));
    }

    #[test]
    fn test_not_in_object_error() {
        let mut b = Builder::new(0).unwrap();
        assert_eq!(Err(BuilderError::NotInObject), b.end_object());
        assert_eq!(Err(BuilderError::NotInObject), b.slot(0));
    }

    #[test]
    fn test_struct_is_not_inline_error() {
        let mut b = Builder::new(0).unwrap();
        b.start_object(1).unwrap();
        assert_eq!(
            Err(BuilderError::StructIsNotInline),
            b.prepend_struct_slot(0, 12345, 0)
        );
    }

    #[test]
    fn test_reset_reuses_capacity() {
        let mut b = Builder::new(1024).unwrap();
        b.start_object(1).unwrap();
        b.prepend_slot(0, 7i32, 0i32).unwrap();
        let obj = b.end_object().unwrap();
        b.finish(obj).unwrap();

        let capacity_before = b.buf.len();
        b.reset();
        assert_eq!(capacity_before, b.buf.len());
        assert_eq!(0, b.offset());
    }
}
