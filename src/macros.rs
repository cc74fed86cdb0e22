/// Build an argument list for a logging call.
///
/// Each expression is converted with `Value::from`, so strings, numbers,
/// booleans, options, `serde_json::Value`s and the crate's own containers
/// can be mixed freely.
///
/// ```
/// use cloudlog::args;
///
/// let list = args!["%s -> %d", "foo", 1000, serde_json::json!({"user": "joe"})];
/// assert_eq!(list.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::from($arg)),+]
    };
}
