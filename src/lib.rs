extern crate byteorder;
extern crate thiserror;

mod builder;
mod scalar;
mod string;
mod table;
mod vector;

pub mod error;
pub mod io;
pub mod le;
pub mod position;
pub mod primitive;
pub mod types;

pub use builder::Builder;
pub use error::{BuilderError, Result};
pub use primitive::Primitive;
pub use scalar::Scalar;
pub use string::String;
pub use table::{get_root, Table, TableWithVTable};
pub use vector::Vector;
