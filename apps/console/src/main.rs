use std::io::Write;

use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use edupay_console::{
    commands::{self, HELP},
    infra::{
        config::AppConfig,
        setup::{init_session, init_tracing},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json_path.as_deref());

    let session = init_session(&config)?;
    let controller = session.controller.clone();

    // Log every transition
    let mut updates = controller.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            debug!(
                authenticated = state.is_authenticated,
                loading = state.is_loading,
                school = state.selected_school.as_ref().map(|s| s.id.as_str()),
                "Session state changed"
            );
        }
    });

    let restored = controller.bootstrap();
    info!(restored, "EduPay console ready");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("edupay> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match commands::execute(&controller, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => warn!(error = %e, "Command failed"),
        }
    }

    Ok(())
}
