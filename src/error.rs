use std::result;

use thiserror::Error;

/// Errors raised by [`crate::builder::Builder`] operations.
///
/// These mirror the exception hierarchy of the reference Python implementation;
/// all of them leave the `Builder` in an unspecified state, so the only supported
/// recovery after an `Err` is `Builder::reset`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// Initial size exceeds, or post-growth size would reach or exceed,
    /// [`crate::types::MAX_BUFFER_SIZE`].
    #[error("blockbuffers: cannot create or grow buffer beyond {0} bytes")]
    BuilderSize(usize),

    /// `start_object`/`start_vector`/`create_string` called while an object is already open.
    #[error("blockbuffers: tried to start a new object/vector while one was already in progress")]
    ObjectIsNested,

    /// `slot`/`end_object` called with no object in progress.
    #[error("blockbuffers: tried to write a field or end an object with no object in progress")]
    NotInObject,

    /// `prepend_struct_slot` called with a non-default offset that isn't the builder's current offset.
    #[error("blockbuffers: structs must be written inline at the builder's current offset")]
    StructIsNotInline,

    /// An SOffset/UOffset delta would be negative (the target lies past the current head).
    #[error("blockbuffers: offset arithmetic underflowed; target lies past the current head")]
    OffsetArithmetic,

    /// A scalar value was rejected by its `Primitive::validate`.
    #[error("blockbuffers: value out of range for its scalar kind")]
    Type,
}

/// This crate's fallible-operation result alias.
pub type Result<T> = result::Result<T, BuilderError>;
