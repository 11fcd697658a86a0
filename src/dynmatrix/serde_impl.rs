//! Serde implementations for `DynMatrix`.

use alloc::vec::Vec;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DynMatrix;

#[derive(Deserialize)]
struct SerdeMat<T> {
    nrows: usize,
    ncols: usize,
    /// Column-major.
    data: Vec<T>,
}

#[derive(Serialize)]
#[serde(rename = "SerdeMat")]
struct SerdeMatRef<'a, T> {
    nrows: usize,
    ncols: usize,
    data: &'a [T],
}

impl<T: Serialize> Serialize for DynMatrix<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        SerdeMatRef {
            nrows: self.nrows,
            ncols: self.ncols,
            data: &self.data,
        }
        .serialize(s)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for DynMatrix<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let mat = SerdeMat::<T>::deserialize(d)?;
        if mat.nrows.checked_mul(mat.ncols) != Some(mat.data.len()) {
            return Err(serde::de::Error::custom(
                "serialized matrix data length does not match nrows * ncols",
            ));
        }
        Ok(DynMatrix {
            data: mat.data,
            nrows: mat.nrows,
            ncols: mat.ncols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let m = DynMatrix::from_rows(2, 3, &[1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let s = serde_json::to_string(&m).unwrap();
        assert_eq!(s, r#"{"nrows":2,"ncols":3,"data":[1.0,4.0,2.0,5.0,3.0,6.0]}"#);
        let back: DynMatrix<f64> = serde_json::from_str(&s).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn rejects_bad_length() {
        let r: Result<DynMatrix<f64>, _> =
            serde_json::from_str(r#"{"nrows":2,"ncols":2,"data":[1.0,2.0,3.0]}"#);
        assert!(r.is_err());
    }
}
