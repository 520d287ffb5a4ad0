// src/config.rs

use std::env;

use dotenvy::dotenv;

use crate::error::AppError;

/// Maximum number of nodes used as context for one exam.
pub const MAX_CONTEXT_NODES: usize = 5;

/// Character budget for the article excerpt of each node in the prompt.
pub const ARTICLE_EXCERPT_CHARS: usize = 2000;

/// Number of questions requested from the content-generation service.
pub const REQUESTED_QUESTION_COUNT: usize = 10;

/// Points added to a node score per correct answer.
pub const CORRECT_ANSWER_POINTS: i32 = 20;

/// Points removed from a node score per incorrect answer.
pub const INCORRECT_ANSWER_PENALTY: i32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub mindmap_path: String,
    pub bind_addr: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let openai_api_key = required("OPENAI_API_KEY")?;

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());

        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let mindmap_path =
            env::var("MINDMAP_PATH").unwrap_or_else(|_| "data/mindmap.json".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            openai_api_key,
            openai_base_url,
            openai_model,
            mindmap_path,
            bind_addr,
            rust_log,
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Config(format!("{} must be set", name)))
}
