pub mod learner_word;
pub mod profile;
pub mod vocabulary;
