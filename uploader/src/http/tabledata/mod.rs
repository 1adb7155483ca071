pub mod insert_all;
