use std::{error::Error, process::ExitCode, sync::Arc};

use axum_server::tls_rustls::RustlsConfig;
use ecam::{binding, infrastructure::InMemoryCustomerRepository, EcamConfig};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> ExitCode {
    match EcamConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            match serve(&config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => {
                    error!("アプリケーションエラー: {}", error);
                    ExitCode::FAILURE
                }
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("設定読み込みエラー: {}", error);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: &EcamConfig) -> Result<(), Box<dyn Error>> {
    let repository = Arc::new(InMemoryCustomerRepository::seeded(config.repository.seed));
    let app = binding::router(repository, &config.soap);
    let address = config.server.address;

    match &config.server.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!("https://{} で待ち受け開始 (WSDL: {}?wsdl)", address, config.soap.location);
            axum_server::bind_rustls(address, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("http://{} で待ち受け開始 (WSDL: {}?wsdl)", address, config.soap.location);
            axum_server::bind(address)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
