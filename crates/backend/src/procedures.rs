//! Typed wrappers over the remote procedures the geoportal consumes.

use foundation::geo::LatLng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ServiceError;
use crate::service::DataService;

pub const OBTAIN_REPORTS: &str = "obtener_reportes";
pub const CALCULATE_DISTANCES: &str = "calcular_distancias";
pub const ANALYZE_NEIGHBORHOOD: &str = "analizar_barrio_completo";
pub const INSERT_REPORT: &str = "insertar_reporte";

/// Distances (meters) from a point to the nearest emergency services.
///
/// Values are kept as raw JSON: the backend may send numbers, numeric
/// strings or null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceDistances {
    #[serde(default)]
    pub bomberos: Value,
    #[serde(default)]
    pub policia: Value,
    #[serde(default)]
    pub salud: Value,
}

/// Aggregate figures for one neighborhood.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NeighborhoodAnalysis {
    #[serde(default)]
    pub longitud_alcantarillado: Value,
    #[serde(default)]
    pub bomberos: Value,
    #[serde(default)]
    pub policia: Value,
    #[serde(default)]
    pub salud: Value,
    #[serde(default)]
    pub error: Option<Value>,
}

impl NeighborhoodAnalysis {
    pub fn is_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| !e.is_null())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSubmission {
    pub p_nombre: String,
    pub p_tipo_requerimiento: String,
    pub p_comentarios: String,
    pub p_lat: f64,
    pub p_lng: f64,
}

/// Outcome signalled inside a successful HTTP response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// `success: true`
    Success,
    /// `success: false`
    Rejected,
    /// No usable `success` member.
    Unknown,
}

impl Acknowledgement {
    pub fn from_response(response: &Value) -> Self {
        let body = match response {
            Value::Array(items) if items.len() == 1 => &items[0],
            other => other,
        };
        match body.get("success") {
            Some(Value::Bool(true)) => Acknowledgement::Success,
            Some(Value::Bool(false)) => Acknowledgement::Rejected,
            _ => Acknowledgement::Unknown,
        }
    }
}

/// The single record of a procedure reply.
///
/// Table-returning procedures answer `[{...}]`; scalar ones answer `{...}`.
/// Any other shape is a decode error.
fn single_record(reply: Value) -> Result<Value, ServiceError> {
    match reply {
        Value::Object(_) => Ok(reply),
        Value::Array(mut items) if items.len() == 1 && items[0].is_object() => Ok(items.remove(0)),
        Value::Array(items) => Err(ServiceError::Decode(format!(
            "expected a single record, got an array of {}",
            items.len()
        ))),
        other => Err(ServiceError::Decode(format!(
            "expected a single record, got {other}"
        ))),
    }
}

fn decode_record<T: serde::de::DeserializeOwned>(reply: Value) -> Result<T, ServiceError> {
    serde_json::from_value(single_record(reply)?).map_err(|e| ServiceError::Decode(e.to_string()))
}

pub async fn calculate_distances(
    service: &dyn DataService,
    at: LatLng,
) -> Result<ServiceDistances, ServiceError> {
    let reply = service
        .call(
            CALCULATE_DISTANCES,
            json!({ "lat_punto": at.lat, "lng_punto": at.lng }),
        )
        .await?;
    decode_record(reply)
}

pub async fn analyze_neighborhood(
    service: &dyn DataService,
    name: &str,
) -> Result<NeighborhoodAnalysis, ServiceError> {
    let reply = service
        .call(ANALYZE_NEIGHBORHOOD, json!({ "nombre_barrio": name }))
        .await?;
    decode_record(reply)
}

pub async fn insert_report(
    service: &dyn DataService,
    submission: &ReportSubmission,
) -> Result<Acknowledgement, ServiceError> {
    let params = serde_json::to_value(submission).map_err(|e| ServiceError::Decode(e.to_string()))?;
    let reply = service.call(INSERT_REPORT, params).await?;
    Ok(Acknowledgement::from_response(&reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDataService, RecordedRequest};
    use pretty_assertions::assert_eq;

    #[test]
    fn acknowledgement_is_tri_state() {
        assert_eq!(
            Acknowledgement::from_response(&json!({"success": true})),
            Acknowledgement::Success
        );
        assert_eq!(
            Acknowledgement::from_response(&json!({"success": false, "error": "x"})),
            Acknowledgement::Rejected
        );
        assert_eq!(
            Acknowledgement::from_response(&json!({"id": 4})),
            Acknowledgement::Unknown
        );
        assert_eq!(
            Acknowledgement::from_response(&json!({"success": "false"})),
            Acknowledgement::Unknown
        );
        assert_eq!(
            Acknowledgement::from_response(&json!([{"success": false}])),
            Acknowledgement::Rejected
        );
    }

    #[test]
    fn single_record_unwraps_one_element_arrays() {
        assert_eq!(single_record(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(single_record(json!([{"a": 1}])).unwrap(), json!({"a": 1}));
        for bad in [json!([]), json!([{"a": 1}, {"a": 2}]), json!([3]), json!(7), Value::Null] {
            assert!(matches!(single_record(bad), Err(ServiceError::Decode(_))));
        }
    }

    #[tokio::test]
    async fn distances_send_named_parameters() {
        let svc = MemoryDataService::new().with_procedure(
            CALCULATE_DISTANCES,
            json!({"bomberos": 100.4, "policia": null, "salud": "250"}),
        );
        let d = calculate_distances(&svc, LatLng::new(-4.0, -79.2)).await.unwrap();
        assert_eq!(d.bomberos, json!(100.4));
        assert_eq!(d.policia, Value::Null);
        assert_eq!(
            svc.requests().await,
            vec![RecordedRequest::Call {
                name: CALCULATE_DISTANCES.into(),
                params: json!({"lat_punto": -4.0, "lng_punto": -79.2}),
            }]
        );
    }

    #[tokio::test]
    async fn table_replies_decode_their_only_row() {
        let svc = MemoryDataService::new()
            .with_procedure(
                CALCULATE_DISTANCES,
                json!([{"bomberos": 812.4, "policia": 100, "salud": 5}]),
            )
            .with_procedure(
                ANALYZE_NEIGHBORHOOD,
                json!([{"longitud_alcantarillado": 1520, "bomberos": 1, "policia": 2, "salud": 0}]),
            );
        let d = calculate_distances(&svc, LatLng::new(-4.0, -79.2)).await.unwrap();
        assert_eq!(d.bomberos, json!(812.4));
        assert_eq!(d.policia, json!(100));
        assert_eq!(d.salud, json!(5));
        let a = analyze_neighborhood(&svc, "Centro").await.unwrap();
        assert!(!a.is_error());
        assert_eq!(a.longitud_alcantarillado, json!(1520));
        assert_eq!(a.policia, json!(2));
    }

    #[tokio::test]
    async fn multi_row_replies_are_decode_errors() {
        let svc = MemoryDataService::new()
            .with_procedure(CALCULATE_DISTANCES, json!([{"bomberos": 1}, {"bomberos": 2}]))
            .with_procedure(ANALYZE_NEIGHBORHOOD, json!("Centro"));
        assert!(matches!(
            calculate_distances(&svc, LatLng::new(0.0, 0.0)).await,
            Err(ServiceError::Decode(_))
        ));
        assert!(matches!(
            analyze_neighborhood(&svc, "Centro").await,
            Err(ServiceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn report_submission_body() {
        let svc = MemoryDataService::new().with_procedure(INSERT_REPORT, json!({"success": true}));
        let submission = ReportSubmission {
            p_nombre: "Ana".into(),
            p_tipo_requerimiento: "bache".into(),
            p_comentarios: "hueco grande".into(),
            p_lat: 10.5,
            p_lng: -79.2,
        };
        let ack = insert_report(&svc, &submission).await.unwrap();
        assert_eq!(ack, Acknowledgement::Success);
        let requests = svc.requests().await;
        let RecordedRequest::Call { params, .. } = &requests[0] else {
            panic!("expected a procedure call");
        };
        assert_eq!(params["p_tipo_requerimiento"], json!("bache"));
        assert_eq!(params["p_lng"], json!(-79.2));
    }
}
