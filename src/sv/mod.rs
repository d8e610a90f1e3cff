pub mod links;

pub use links::Links;
