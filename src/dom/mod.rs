pub mod dom_model;
pub mod field;
pub mod page_loader;
