use jiff::{Span, Timestamp};
use mock_api::{Config, Store};
use payloads::{ComponentNum, StatusCode, responses};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, util::SubscriberInitExt};

pub struct TestApp {
    #[allow(unused)]
    pub port: u16,
    /// Base url of the server, without the `/api` suffix.
    pub address: String,
    pub client: payloads::APIClient,
    /// Backing data, shared with the running server.
    pub store: Store,
}

pub async fn spawn_app_on_port(port: u16) -> TestApp {
    spawn_app_with_store(port, Store::new()).await
}

pub async fn spawn_app_with_store(port: u16, store: Store) -> TestApp {
    let config = Config {
        ip: "127.0.0.1".into(),
        port,
    };
    spawn_app_with_config(config, store).await
}

/// Spawn the mock API with the given bind address and data.
pub async fn spawn_app_with_config(mut config: Config, store: Store) -> TestApp {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("error"))
        .with_writer(std::io::stderr)
        .finish();
    let _ = LogTracer::init();
    let _ = subscriber.try_init();

    let server = mock_api::build(&mut config, store.clone()).unwrap();
    tokio::spawn(server);

    let address = format!("http://{}:{}", config.ip, config.port);
    TestApp {
        port: config.port,
        client: payloads::APIClient::new(address.clone()),
        address,
        store,
    }
}

/// Spawn the mock API on an OS-assigned port.
pub async fn spawn_app() -> TestApp {
    spawn_app_on_port(0).await
}

/// Assert that the result of an API action results in a specific status code.
pub fn assert_status_code<T>(
    result: Result<T, payloads::ClientError>,
    expected: StatusCode,
) {
    match result {
        Err(payloads::ClientError::APIError(code, _)) => {
            assert_eq!(code, expected)
        }
        _ => panic!("Expected APIError"),
    };
}

/// A slow query recorded `minutes_ago` before `now`.
pub fn slow_query(
    now: Timestamp,
    minutes_ago: i64,
    db: &str,
    query: &str,
) -> responses::SlowQuery {
    let timestamp = now - Span::new().minutes(minutes_ago);
    responses::SlowQuery {
        digest: format!("digest-{minutes_ago}"),
        query: query.into(),
        instance: "127.0.0.1:4000".into(),
        db: db.into(),
        connection_id: minutes_ago.to_string(),
        success: true,
        timestamp: timestamp.as_second() as f64,
        query_time: 1.5,
        parse_time: 0.001,
        compile_time: 0.002,
        process_time: 1.2,
        memory_max: 2048,
        txn_start_ts: 0,
    }
}

/// A profiling round started `minutes_ago` before `now`.
pub fn group_profile(
    now: Timestamp,
    minutes_ago: i64,
    state: &str,
) -> responses::GroupProfile {
    responses::GroupProfile {
        ts: (now - Span::new().minutes(minutes_ago)).as_second(),
        profile_duration_secs: 10,
        state: state.into(),
        component_num: ComponentNum {
            tidb: 1,
            pd: 1,
            tikv: 3,
            tiflash: 0,
        },
    }
}
