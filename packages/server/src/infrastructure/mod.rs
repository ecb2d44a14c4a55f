//! Infrastructure layer: concrete repositories, collaborators and wire DTOs.

pub mod collaborator;
pub mod dto;
pub mod repository;
