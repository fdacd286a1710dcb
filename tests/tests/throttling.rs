mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use clap::Parser;
    use std::sync::Arc;
    use tickburst::{
        Classification, LogReporter, Operation, RunConfig, TickScheduler, THROTTLING_CODE,
    };
    use tickburst_cli::client::{create_network_op, list_services_op};
    use tickburst_cli::cli::{Cli, CREATE_STREAM, READ_STREAM};
    use tickburst_cli::{ControlPlaneClient, SetupError};

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(10000)]
    async fn burst_above_quota_is_partly_throttled() {
        let (endpoint, addr) = mock(limits(100, 5)).await;
        let client = Arc::new(ControlPlaneClient::connect(&endpoint).await.unwrap());

        let config = RunConfig::new().ticks(1).stream(CREATE_STREAM, 20);
        let report = TickScheduler::new(config)
            .operation(CREATE_STREAM, create_network_op(client))
            .run(&LogReporter)
            .await
            .unwrap();

        let summary = report.stream(CREATE_STREAM).next().unwrap();
        assert_eq!(summary.total, 20);
        assert!(summary.success >= 1);
        assert!(summary.throttled >= 1);
        assert_eq!(summary.success + summary.throttled, 20);
        assert_eq!(summary.errors.get(THROTTLING_CODE), Some(&summary.throttled));
        assert!(summary.is_consistent());
        assert!(logs_contain("results summary"));

        // No retries: one request on the wire per attempt.
        assert_eq!(stats(addr).await.requests, 20);
    }

    #[tokio::test]
    #[ntest::timeout(10000)]
    async fn streams_are_summarized_independently() {
        let (endpoint, addr) = mock(limits(100, 1)).await;
        let client = Arc::new(ControlPlaneClient::connect(&endpoint).await.unwrap());

        let config = RunConfig::new()
            .ticks(2)
            .stream(CREATE_STREAM, 4)
            .stream(READ_STREAM, 6);
        let report = TickScheduler::new(config)
            .operation(CREATE_STREAM, create_network_op(client.clone()))
            .operation(READ_STREAM, list_services_op(client))
            .run(&LogReporter)
            .await
            .unwrap();

        assert_eq!(report.ticks.len(), 2);
        for tick in &report.ticks {
            let names: Vec<_> = tick.summaries.iter().map(|s| s.stream.as_str()).collect();
            assert_eq!(names, [CREATE_STREAM, READ_STREAM]);
        }
        for summary in report.stream(READ_STREAM) {
            assert_eq!(summary.total, 6);
            assert_eq!(summary.success, 6);
        }
        for summary in report.stream(CREATE_STREAM) {
            assert_eq!(summary.total, 4);
            assert!(summary.throttled >= 2);
        }
        assert_eq!(stats(addr).await.requests, 20);
    }

    #[tokio::test]
    #[ntest::timeout(10000)]
    async fn conflicts_are_other_errors() {
        let (endpoint, _addr) = mock(limits(100, 100)).await;
        let client = Arc::new(ControlPlaneClient::connect(&endpoint).await.unwrap());

        let op = Operation::new(move || {
            let client = client.clone();
            async move { client.create_network("fixed-throttle-test").await }
        });
        let config = RunConfig::new().ticks(1).stream(CREATE_STREAM, 2);
        let report = TickScheduler::new(config)
            .operation(CREATE_STREAM, op)
            .run(&LogReporter)
            .await
            .unwrap();

        let summary = report.stream(CREATE_STREAM).next().unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.throttled, 0);
        assert_eq!(summary.other, 1);
        assert_eq!(summary.errors.get("ConflictException"), Some(&1));
        assert_ne!(
            Classification::from_code(Some("ConflictException")),
            Classification::Throttled
        );
    }

    #[tokio::test]
    #[ntest::timeout(10000)]
    async fn unreachable_endpoint_aborts_before_any_tick() {
        let (endpoint, addr) = mock(limits(100, 100)).await;
        let cli = Cli {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..cli_for(&endpoint)
        };
        let config = RunConfig::new().ticks(3).stream(CREATE_STREAM, 5);

        let res = tickburst_cli::run(&cli, config, &LogReporter).await;
        assert!(matches!(res, Err(SetupError::Unreachable { .. })));
        assert_eq!(stats(addr).await.requests, 0);
    }

    #[tokio::test]
    #[ntest::timeout(10000)]
    async fn cli_run_reports_every_tick() {
        let (endpoint, _addr) = mock(limits(100, 100)).await;
        let cli = cli_for(&endpoint);
        let config = RunConfig::new()
            .ticks(2)
            .stream(CREATE_STREAM, 0)
            .stream(READ_STREAM, 3);

        let report = tickburst_cli::run(&cli, config, &LogReporter).await.unwrap();
        assert_eq!(report.ticks.len(), 2);
        assert_eq!(report.stream(CREATE_STREAM).count(), 0);
        assert_eq!(report.stream(READ_STREAM).map(|s| s.success).sum::<u64>(), 6);
    }

    fn cli_for(endpoint: &str) -> Cli {
        Cli::parse_from([
            "tickburst",
            "--endpoint",
            endpoint,
            "--format",
            "log",
        ])
    }
}
