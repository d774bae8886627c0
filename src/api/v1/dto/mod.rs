pub mod discussions;
