/// OpenAPI documentation generation.
pub mod documentation;
/// Moderator-driven phase transitions.
pub mod game_flow_service;
/// Health check service.
pub mod health_service;
/// Player-facing join/buzz/answer/spoken operations.
pub mod player_service;
/// Question-set replacement with shuffle verification.
pub mod question_service;
/// Session registry and save/load operations.
pub mod session_service;
/// Read-only snapshot and statistics assembly.
pub mod snapshot_service;
