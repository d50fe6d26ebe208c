use tfe_http::{ClientOptions, TfeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let organization = std::env::var("TFE_ORG")?;
    let workspace = std::env::var("TFE_WORKSPACE")?;

    let tfe = TfeClient::from_env()
        .map_err(anyhow::Error::msg)?
        .with_options(ClientOptions {
            page_size: Some(100),
            ..ClientOptions::default()
        });

    for ws in tfe.list_workspaces(&organization).await? {
        println!("{} {}", ws.id, ws.attributes.name);
    }

    let latest = tfe
        .get_latest_state_version(&organization, &workspace)
        .await?;
    println!("latest state version: {} (serial {})", latest.id, latest.attributes.serial);

    let state = tfe.download_state_version(&latest).await?;
    println!("downloaded {} bytes of state", state.len());

    Ok(())
}
