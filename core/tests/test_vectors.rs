//! Verify response classification and error normalization against the JSON
//! test vectors in `test-vectors/`.
//!
//! Each case is a simulated response and either the payload it settles into
//! or the normalized error. Comparing parsed JSON avoids false negatives from
//! field ordering.

use req_state::{ClientConfig, HttpClient, HttpResponse, RequestError};

fn client() -> HttpClient {
    HttpClient::new(ClientConfig::new("http://localhost:3000")).unwrap()
}

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            body: sim["body"].as_str().unwrap().to_string(),
        };

        let settled = c.parse_response(response).map_err(RequestError::from);

        if let Some(expected_error) = case.get("expected_error") {
            let expected: RequestError = serde_json::from_value(expected_error.clone()).unwrap();
            assert_eq!(settled, Err(expected), "{name}: normalized error");
        } else {
            assert_eq!(settled, Ok(case["expected_result"].clone()), "{name}: payload");
        }
    }
}
