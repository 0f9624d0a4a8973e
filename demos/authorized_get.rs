//! Wires an HTTP credential issuer, background renewal, and the authorizing request decorator
//! against local mock servers.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use bearer_keeper::{
	client::AuthorizedClient,
	manager::CredentialManager,
	obs::{CredentialEvent, EventCounters},
	reqwest::Client,
	source::HttpCredentialSource,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let issuer_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"demo-token\",\"expire\":300}");
		})
		.await;
	let resource_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/items").header("authorization", "Bearer demo-token");
			then.status(200).body("[\"alpha\",\"beta\"]");
		})
		.await;
	let counters = Arc::new(EventCounters::default());
	let manager = CredentialManager::builder(HttpCredentialSource::new(&server.url("/auth"))?)
		.with_observer(counters.clone())
		.build();

	manager.start_auto_refresh()?;

	let client = AuthorizedClient::with_default_client(manager.clone())?;
	let request = Client::new().get(server.url("/items")).build()?;
	let response = client.execute_checked(request).await?;

	println!("Resource answered: {}.", response.text().await?);
	println!(
		"Credentials issued: {}, renewal pending: {}.",
		counters.count(CredentialEvent::Refreshed),
		manager.is_auto_refreshing()
	);

	manager.stop_auto_refresh();
	issuer_mock.assert_async().await;
	resource_mock.assert_async().await;

	Ok(())
}
