use mock_service::{Limits, StatsBody};
use std::net::SocketAddr;
use std::num::NonZeroU32;

/// Start a mock control plane on an ephemeral port owned by the current runtime.
#[allow(unused)]
pub async fn mock(limits: Limits) -> (String, SocketAddr) {
    let addr = mock_service::spawn(limits).await.unwrap();
    (format!("http://{addr}"), addr)
}

#[allow(unused)]
pub fn limits(list: u32, create: u32) -> Limits {
    Limits {
        list_networks: NonZeroU32::new(list).unwrap(),
        list_services: NonZeroU32::new(list).unwrap(),
        create_network: NonZeroU32::new(create).unwrap(),
        ..Default::default()
    }
}

#[allow(unused)]
pub async fn stats(addr: SocketAddr) -> StatsBody {
    reqwest::get(format!("http://{addr}/stats"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}
