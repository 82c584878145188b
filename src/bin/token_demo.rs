use std::sync::Arc;
use std::time::Duration;
use tokenkeeper::application_impl::*;
use tokenkeeper::application_port::*;
use tokenkeeper::domain_model::TokenKind;
use tokenkeeper::logger::*;
use tokenkeeper::settings::*;

// $ cargo run --bin token_demo -- --settings=settings/dev.toml
fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;

    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let signer = JwtHs256Signer::new(
        JwtConfig {
            issuer: project_settings.auth.issuer.clone(),
            audience: project_settings.auth.audience.clone(),
            signing_key: project_settings.auth.signing_secret.clone().into_bytes(),
        },
        clock.clone(),
    )?;

    let (token, payload) = signer.sign("a@x.com", TokenKind::Access, Duration::from_secs(60))?;
    info!(%token, ?payload, "signed");
    info!(verified = ?signer.verify(&token), "fresh token");

    clock.advance(chrono::Duration::seconds(61));
    info!(verified = ?signer.verify(&token), "after expiry");

    let mut tampered = token.clone();
    tampered.push('x');
    info!(verified = ?signer.verify(&tampered), "tampered");

    Ok(())
}
