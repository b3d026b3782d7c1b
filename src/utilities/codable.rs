//!Serde adapters for math types that come from foreign crates.
use serde::{Deserialize, Deserializer};

use super::math::Vec3;

macro_rules! impl_deserialize {
    ($typename:ty, $converter:expr) => {
        impl<'de> Deserialize<'de> for $typename {
            fn deserialize<D>(deserializer: D) -> Result<$typename, D::Error>
                where D: Deserializer<'de>
            {
                $converter(deserializer)
            }
        }
    }
}

///Wrapper that decodes its inner type from a plain array, so configs can
///say `[x, y, z]` instead of spelling out struct fields.
#[derive(Debug, Clone)]
pub struct CodableWrapper<T>(pub T);

impl<T: Clone> CodableWrapper<T> {
    pub fn get(&self) -> T {self.0.clone()}
}

impl<T> From<T> for CodableWrapper<T> {
    fn from(value: T) -> CodableWrapper<T> {
        CodableWrapper(value)
    }
}

impl_deserialize!(CodableWrapper<Vec3>, |deserializer| {
    let arr: [f32; 3] = <[f32; 3] as Deserialize>::deserialize(deserializer)?;
    Ok(CodableWrapper(Vec3 {
        x: arr[0],
        y: arr[1],
        z: arr[2]
    }))
});
