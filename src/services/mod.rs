pub mod audio_service;
pub mod auth_service;
pub mod cleanup_service;
pub mod favorite_service;
pub mod history_service;
pub mod mail_service;
pub mod media_service;
pub mod playlist_service;
pub mod profile_service;
