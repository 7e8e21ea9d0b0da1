//! Raw Record Module
//! One row of the earmark dataset as served by the endpoint.
//!
//! The endpoint is not strict about types: codes show up as numbers or strings
//! and monetary figures may be null, so every field is deserialized leniently.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One (year, action, beneficiary, modality) row.
///
/// Missing text fields stay `None` so they become nulls in the frame and
/// drop out of any grouping keyed on them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmendaRecord {
    #[serde(rename = "Ano", default, deserialize_with = "lenient_i64")]
    pub year: Option<i64>,
    /// Budget unit code; carried for completeness, not used by the views
    #[serde(rename = "UO_cod", default, deserialize_with = "lenient_string")]
    pub budget_code: Option<String>,
    #[serde(rename = "Acao_cod", default, deserialize_with = "lenient_string")]
    pub action_code: Option<String>,
    #[serde(rename = "Acao_desc", default, deserialize_with = "lenient_string")]
    pub action_desc: Option<String>,
    #[serde(
        rename = "ResultadoPrimario_cod",
        default,
        deserialize_with = "lenient_i64"
    )]
    pub primary_result_code: Option<i64>,
    #[serde(rename = "Funcao_desc", default, deserialize_with = "lenient_string")]
    pub function_desc: Option<String>,
    #[serde(
        rename = "ModalidadeAplicacao_desc",
        default,
        deserialize_with = "lenient_string"
    )]
    pub modality_desc: Option<String>,
    #[serde(rename = "loa_mais_credito", default, deserialize_with = "lenient_f64")]
    pub appropriated: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub empenhado: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pago: Option<f64>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        }
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_string_codes() {
        let json = r#"[
            {"Ano": 2024, "Acao_cod": "0EC2", "ResultadoPrimario_cod": 6,
             "loa_mais_credito": 10.5, "empenhado": 3, "pago": null},
            {"Ano": "2025", "Acao_cod": 2000, "ResultadoPrimario_cod": "7",
             "loa_mais_credito": "4.25", "Funcao_desc": "Saúde", "extra": [1, 2]}
        ]"#;
        let records: Vec<EmendaRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].year, Some(2024));
        assert_eq!(records[0].action_code.as_deref(), Some("0EC2"));
        assert_eq!(records[0].primary_result_code, Some(6));
        assert_eq!(records[0].empenhado, Some(3.0));
        assert_eq!(records[0].pago, None);

        assert_eq!(records[1].year, Some(2025));
        assert_eq!(records[1].action_code.as_deref(), Some("2000"));
        assert_eq!(records[1].primary_result_code, Some(7));
        assert_eq!(records[1].appropriated, Some(4.25));
        assert_eq!(records[1].function_desc.as_deref(), Some("Saúde"));
        assert_eq!(records[1].modality_desc, None);
        assert_eq!(records[1].action_desc, None);
    }

    #[test]
    fn float_codes_are_accepted_when_integral() {
        let record: EmendaRecord =
            serde_json::from_str(r#"{"ResultadoPrimario_cod": 8.0, "Ano": 2023.5}"#).unwrap();
        assert_eq!(record.primary_result_code, Some(8));
        assert_eq!(record.year, None);
    }
}
