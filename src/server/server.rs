use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Everything a request handler needs, built once at startup and shared by
/// reference with the router.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub token_signer: Arc<dyn TokenSigner>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub fn new(auth_service: Arc<dyn AuthService>, token_signer: Arc<dyn TokenSigner>) -> Self {
        Self {
            auth_service,
            token_signer,
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // A short secret is fatal here, before anything listens.
        let token_signer: Arc<dyn TokenSigner> = Arc::new(JwtHs256Signer::new(
            JwtConfig {
                issuer: settings.auth.issuer.clone(),
                audience: settings.auth.audience.clone(),
                signing_key: settings.auth.signing_secret.clone().into_bytes(),
            },
            clock.clone(),
        )?);

        let session_store: Arc<dyn SessionStore> = match settings.session.backend.as_str() {
            "memory" => Arc::new(MemorySessionStore::new(clock.clone())),
            "redis" => {
                let url = settings
                    .session
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("session.redis_url is required for the redis backend"))?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisSessionStore::new(
                    redis_manager,
                    clock.clone(),
                    Duration::from_millis(settings.session.op_timeout_ms),
                    settings.session.scan_batch,
                ))
            }
            other => return Err(anyhow!("Unknown session backend: {}", other)),
        };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let mut pool = None;
        let user_repo: Arc<dyn UserRepo> = match settings.user.backend.as_str() {
            "memory" => {
                let repo = MemoryUserRepo::new();
                for seed in &settings.user.seed {
                    let hash = credential_hasher.hash_password(&seed.password).await?;
                    repo.insert_user(&seed.email, &hash);
                }
                info!(users = settings.user.seed.len(), "in-memory user store seeded");
                Arc::new(repo)
            }
            "mysql" => {
                let dsn = settings
                    .user
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("user.mysql_dsn is required for the mysql backend"))?;
                let mysql = Pool::<MySql>::connect(dsn).await?;
                pool = Some(mysql.clone());
                Arc::new(MySqlUserRepo::new(mysql))
            }
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo,
            credential_hasher,
            token_signer.clone(),
            session_store,
            TokenTtls {
                access: settings.auth.access_ttl(),
                refresh: settings.auth.refresh_ttl(),
            },
        ));

        info!(
            session_backend = %settings.session.backend,
            user_backend = %settings.user.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            token_signer,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
