//! HTTP predictor behaviour against a throwaway local server.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use evroute_lib::{EnergyEstimator, EnergyQuery, PredictorConfig};

/// Serve exactly one request, replying with `status` and `body` after `delay`.
///
/// The captured request (headers and body) is sent back over the channel.
fn serve_once(
    status: &'static str,
    body: &'static str,
    delay: Duration,
) -> (SocketAddr, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let request = read_request(&mut stream);
        let _ = tx.send(request);
        thread::sleep(delay);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });

    (addr, rx)
}

fn read_request(stream: &mut impl Read) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(read) = stream.read(&mut chunk) else {
            break;
        };
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(split) = text.find("\r\n\r\n") {
            let content_length = text[..split]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= split + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn query() -> EnergyQuery {
    EnergyQuery {
        distance_km: 100.0,
        elevation_gain_m: 500.0,
        battery_capacity_kwh: 60.0,
    }
}

fn estimator_for(addr: SocketAddr, timeout: Duration) -> EnergyEstimator {
    let config = PredictorConfig::new(format!("http://{addr}")).with_timeout(timeout);
    EnergyEstimator::http(&config).expect("client builds")
}

#[test]
fn successful_prediction_is_used_verbatim() {
    let (addr, requests) = serve_once("200 OK", r#"{"energy_kwh": 12.5}"#, Duration::ZERO);
    let estimator = estimator_for(addr, Duration::from_secs(5));

    let estimate = estimator.estimate(&query());
    assert_eq!(estimate.energy_kwh, 12.5);
    assert!(!estimate.used_fallback);

    let request = requests
        .recv_timeout(Duration::from_secs(5))
        .expect("request captured");
    assert!(request.starts_with("POST /predict HTTP/1.1"));
    assert!(request.contains(r#""distance_km":100.0"#));
    assert!(request.contains(r#""elevation_gain_m":500.0"#));
    assert!(request.contains(r#""battery_capacity_kwh":60.0"#));
}

#[test]
fn server_error_falls_back_to_heuristic() {
    let (addr, _requests) = serve_once(
        "500 Internal Server Error",
        r#"{"error": "model offline"}"#,
        Duration::ZERO,
    );
    let estimate = estimator_for(addr, Duration::from_secs(5)).estimate(&query());

    assert!(estimate.used_fallback);
    assert_eq!(estimate.energy_kwh, 16.0);
}

#[test]
fn malformed_body_falls_back_to_heuristic() {
    let (addr, _requests) = serve_once("200 OK", r#"{"kwh": "lots"}"#, Duration::ZERO);
    let estimate = estimator_for(addr, Duration::from_secs(5)).estimate(&query());

    assert!(estimate.used_fallback);
    assert_eq!(estimate.energy_kwh, 16.0);
}

#[test]
fn slow_predictor_times_out_and_falls_back() {
    let (addr, _requests) = serve_once("200 OK", r#"{"energy_kwh": 1.0}"#, Duration::from_secs(2));
    let estimate = estimator_for(addr, Duration::from_millis(200)).estimate(&query());

    assert!(estimate.used_fallback);
    assert_eq!(estimate.energy_kwh, 16.0);
}

#[test]
fn refused_connection_falls_back_to_heuristic() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr")
    };
    let estimate = estimator_for(addr, Duration::from_secs(1)).estimate(&query());

    assert!(estimate.used_fallback);
    assert_eq!(estimate.energy_kwh, 16.0);
}
