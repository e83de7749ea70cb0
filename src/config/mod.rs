pub mod game_dirs;
pub mod settings;
