extern crate blockbuffers;

use blockbuffers::position::TablePosition;
use blockbuffers::{get_root, Builder, Scalar, Table};

#[test]
fn round_trips_scalar_fields_with_default_elision() {
    let mut b = Builder::new(0).unwrap();
    b.start_object(2).unwrap();
    b.prepend_slot(0, 9i32, 0i32).unwrap();
    b.prepend_slot(1, 0i32, 0i32).unwrap();
    let obj = b.end_object().unwrap();
    b.finish(obj).unwrap();

    let data = b.output();
    let root = get_root(&data[..], 0);

    assert_eq!(9, root.get_slot::<i32>(4, 0));
    assert_eq!(0, root.get_slot::<i32>(6, 0));
    // The defaulted second field was never written, so its vtable slot stays 0.
    assert_eq!(0, root.field_offset(6));
}

#[test]
fn round_trips_a_string_field() {
    let mut b = Builder::new(0).unwrap();
    let name = b.create_str("blockbuffers").unwrap();

    b.start_object(1).unwrap();
    b.prepend_uoffset_relative_slot(0, name, 0).unwrap();
    let obj = b.end_object().unwrap();
    b.finish(obj).unwrap();

    let data = b.output();
    let root = get_root(&data[..], 0);

    assert_eq!("blockbuffers", root.string_field(4).unwrap().as_str());
}

#[test]
fn round_trips_a_vector_of_scalars() {
    let mut b = Builder::new(0).unwrap();
    let values = [1u16, 2, 3, 5, 8];

    b.start_vector(2, values.len(), 2).unwrap();
    for &v in values.iter().rev() {
        b.prepend(v).unwrap();
    }
    let vec_offset = b.end_vector(values.len()).unwrap();

    b.start_object(1).unwrap();
    b.prepend_uoffset_relative_slot(0, vec_offset, 0).unwrap();
    let obj = b.end_object().unwrap();
    b.finish(obj).unwrap();

    let data = b.output();
    let root = get_root(&data[..], 0);

    let field = root.vector_field::<Scalar<u16>>(4).unwrap();
    let collected: Vec<u16> = field.iter().map(|s| (*s).into()).collect();
    assert_eq!(&values[..], &collected[..]);
}

#[test]
fn round_trips_a_nested_table() {
    let mut b = Builder::new(0).unwrap();

    b.start_object(1).unwrap();
    b.prepend_slot(0, 77i32, 0i32).unwrap();
    let inner = b.end_object().unwrap();

    b.start_object(1).unwrap();
    b.prepend_uoffset_relative_slot(0, inner, 0).unwrap();
    let outer = b.end_object().unwrap();
    b.finish(outer).unwrap();

    let data = b.output();
    let root = get_root(&data[..], 0);

    let child: Table<&&[u8]> = root.table_field(4).unwrap();
    let child = child.into_with_vtable();
    assert_eq!(77, child.get_slot::<i32>(4, 0));
}

#[test]
fn deduplicates_structurally_identical_vtables_across_objects() {
    let mut b = Builder::new(0).unwrap();

    b.start_object(2).unwrap();
    b.prepend_slot(0, 1i32, 0i32).unwrap();
    b.prepend_slot(1, 2i32, 0i32).unwrap();
    let first = b.end_object().unwrap();

    b.start_object(2).unwrap();
    b.prepend_slot(0, 3i32, 0i32).unwrap();
    b.prepend_slot(1, 4i32, 0i32).unwrap();
    let second = b.end_object().unwrap();

    // Differently-shaped object: only one of two slots populated, so its vtable differs.
    b.start_object(2).unwrap();
    b.prepend_slot(0, 5i32, 0i32).unwrap();
    let third = b.end_object().unwrap();

    let data = b.output();
    let table_at = |offset: usize| {
        Table::new(&data[..], TablePosition::new(data.len() - offset)).into_with_vtable()
    };

    let a = table_at(first);
    let c = table_at(second);
    let e = table_at(third);

    assert_eq!(a.position().position(), c.position().position());
    assert_ne!(a.position().position(), e.position().position());
}
