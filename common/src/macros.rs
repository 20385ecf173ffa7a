/// Build a `PathBuf` out of separate components.
///
/// ```
/// use std::path::PathBuf;
/// use acute_common::makepath;
///
/// let p: PathBuf = makepath!("/home", ".config", "acute");
/// assert_eq!(PathBuf::from("/home/.config/acute"), p);
/// ```
///
#[macro_export]
macro_rules! makepath {
    ($($item:expr),+) => {
        [
        $(::std::path::PathBuf::from($item),)+
        ]
        .iter()
        .collect()
    };
}
