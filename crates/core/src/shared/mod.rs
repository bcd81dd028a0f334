pub mod cancellation;
pub mod collaborator;
pub mod usecase;

#[cfg(test)]
pub mod testing;
