// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM (Postgres en prod,
//   SQLite en mémoire dans les tests).
//
// Liste des modules:
//   - users : Comptes (hash du mot de passe, vérification email, avatar)
//   - session_tokens : Tokens de session actifs (un par appareil)
//   - email_verification_tokens : OTP de vérification email (expire 1h)
//   - password_reset_tokens : Tokens de reset password (expire 1h)
//   - audios : Audios uploadés + catégories
//   - favorites : Favoris (un audio par ligne)
//   - playlists / playlist_items : Playlists et leur contenu ordonné
//   - history_entries : Historique d'écoute
//   - follows : Abonnements entre utilisateurs
//   - dto : Requêtes validées et réponses de l'API
//
// Points d'attention:
//   - Tous les identifiants sont des UUID v4 générés côté Rust
//   - Les relations entre tables sont définies dans chaque modèle
//     (utilisées pour les jointures et les FK de db::sync_schema)
//
// ============================================================================

pub mod users;
pub mod session_tokens;
pub mod email_verification_tokens;
pub mod password_reset_tokens;
pub mod audios;
pub mod favorites;
pub mod playlists;
pub mod playlist_items;
pub mod history_entries;
pub mod follows;
pub mod dto;
