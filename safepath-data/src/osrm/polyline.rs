//! Decoder for Google's encoded polyline format at five decimal places, as
//! returned by OSRM with `geometries=polyline`.

use geo::Coord;
use safepath_core::ProviderError;

const PRECISION: f64 = 1e5;

/// Decode `encoded` into coordinates (`x` longitude, `y` latitude).
///
/// # Errors
///
/// Returns [`ProviderError::ParseError`] when the string contains characters
/// outside the polyline alphabet or ends mid-value.
///
/// # Examples
///
/// ```
/// use safepath_data::osrm::decode_polyline;
///
/// let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").expect("valid polyline");
/// assert_eq!(points.len(), 3);
/// assert!((points[0].y - 38.5).abs() < 1e-9);
/// assert!((points[0].x + 120.2).abs() < 1e-9);
/// ```
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coord<f64>>, ProviderError> {
    let mut bytes = encoded.bytes();
    let mut points = Vec::with_capacity(encoded.len() / 4);
    let (mut lat, mut lng) = (0_i64, 0_i64);
    while let Some(lat_delta) = next_value(&mut bytes)? {
        let lng_delta = next_value(&mut bytes)?.ok_or_else(|| truncated(encoded))?;
        lat += lat_delta;
        lng += lng_delta;
        points.push(Coord {
            x: to_degrees(lng),
            y: to_degrees(lat),
        });
    }
    Ok(points)
}

fn next_value(bytes: &mut impl Iterator<Item = u8>) -> Result<Option<i64>, ProviderError> {
    let mut result = 0_i64;
    let mut shift = 0_u32;
    loop {
        let Some(byte) = bytes.next() else {
            return if shift == 0 {
                Ok(None)
            } else {
                Err(ProviderError::ParseError {
                    message: "polyline ends mid-value".to_owned(),
                })
            };
        };
        if !(63..=126).contains(&byte) || shift > 60 {
            return Err(ProviderError::ParseError {
                message: format!("invalid polyline byte {byte:#04x}"),
            });
        }
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    let value = if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Ok(Some(value))
}

fn truncated(encoded: &str) -> ProviderError {
    ProviderError::ParseError {
        message: format!("polyline {encoded:?} has an odd number of values"),
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "scaled coordinates stay far below 2^52"
)]
fn to_degrees(value: i64) -> f64 {
    value as f64 / PRECISION
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn decodes_reference_polyline() {
        let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").expect("valid polyline");
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        assert_eq!(points.len(), expected.len());
        for (point, (lat, lng)) in points.iter().zip(expected) {
            assert!((point.y - lat).abs() < 1e-9, "lat {}", point.y);
            assert!((point.x - lng).abs() < 1e-9, "lng {}", point.x);
        }
    }

    #[rstest]
    fn empty_polyline_has_no_points() {
        assert_eq!(decode_polyline(""), Ok(Vec::new()));
    }

    #[rstest]
    #[case("_p~iF")]
    #[case("_p~iF~ps|")]
    #[case("_p~iF~ps|U\u{7f}")]
    fn malformed_polylines_are_rejected(#[case] encoded: &str) {
        assert!(matches!(
            decode_polyline(encoded),
            Err(ProviderError::ParseError { .. })
        ));
    }
}
