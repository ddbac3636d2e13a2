use crate::{config::Settings, error, server};

pub async fn serve() {
    let settings = Settings::from_env();
    if let Err(e) = server::start_api_server(settings).await {
        error!("Server stopped. Err: {}", e);
    }
}
