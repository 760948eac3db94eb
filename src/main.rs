use bistro_admin::config::AppConfig;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = bistro_admin::run(config).await {
        eprintln!("bistro-admin: {}", e);
        std::process::exit(1);
    }
}
