use crate::utils::password;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub session_maxage: i64,
    pub frontend_urls: Vec<String>,
    pub store_email: String,
    pub upload_dir: String,
    pub port: u16,
}

impl Config {

    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
        let admin_username = std::env::var("ADMIN_USERNAME").expect("ADMIN_USERNAME must be set");
        // Prefer a pre-computed Argon2 hash; hash a plain ADMIN_PASSWORD at
        // startup as a fallback so local setups don't need the hash tooling.
        let admin_password_hash = match std::env::var("ADMIN_PASSWORD_HASH") {
            Ok(hash) => hash,
            Err(_) => {
                let plain = std::env::var("ADMIN_PASSWORD")
                    .expect("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set");
                password::hash(plain).expect("failed to hash ADMIN_PASSWORD")
            }
        };
        let session_maxage = std::env::var("SESSION_MAXAGE").expect("SESSION_MAXAGE must be set");
        let frontend_urls = std::env::var("FRONTEND_URLS").expect("FRONTEND_URLS must be set");
        let store_email = std::env::var("STORE_EMAIL").expect("STORE_EMAIL must be set");
        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        Config {
            database_url,
            redis_url,
            admin_username,
            admin_password_hash,
            session_maxage: session_maxage.parse::<i64>().unwrap(),
            frontend_urls: frontend_urls
                .split(',')
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            store_email,
            upload_dir,
            port: 8000,
        }
    }

}
