pub mod coordinator;
pub mod loading;
pub mod sink;
