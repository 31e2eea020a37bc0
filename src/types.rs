/// Raw author key bytes.
/// Example: `b"unixpickle"`
pub type UserKey = Vec<u8>;
/// Raw message body bytes.
/// Example: `b"This is a tweet."`
pub type Text = Vec<u8>;
/// Position of a contiguous key run inside a store's index.
/// Example: `0` for the first user in file order.
pub type GroupIdx = usize;
/// Absolute byte position inside a store file.
/// Example: `27` for a group that starts after one `("bob", "hello")` record.
pub type ByteOffset = u64;
