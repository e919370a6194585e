pub mod notify;
pub mod usecases;
