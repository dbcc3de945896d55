mod async_wrapper;
mod file_phonebook_repository;
mod traits;

pub use async_wrapper::AsyncFilePhonebookRepository;
pub use file_phonebook_repository::{FilePhonebookRepository, RepositoryOptions};
pub use traits::PhonebookRepository;
