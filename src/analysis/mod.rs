pub mod recommender;
pub mod scorer;
pub mod tables;
