pub mod embedding_error;
