use std::fmt::Debug;

use downcast_rs::{impl_downcast, Downcast};
use dyn_clone::{clone_trait_object, DynClone};

/// A trait that represents the content carried by a packet. Extend this to a custom type
/// (e.g. struct) holding whatever a node wants to exchange with its neighbours. The byte size
/// is used for statistics and by transmission models that depend on the payload length.
///
/// Messages are cloned once per receiver when broadcast.
pub trait Message: DynClone + Downcast + Debug + Send {
    fn byte_size(&self) -> usize;
}

impl_downcast!(Message);
clone_trait_object!(Message);

/// Data attached to a timer and handed back when the timer fires.
pub trait TimerData: DynClone + Downcast + Debug + Send {}

impl<T: Clone + Debug + Send + 'static> TimerData for T {}

impl_downcast!(TimerData);
clone_trait_object!(TimerData);

/// Distinguishes single-target packets from the copies created by a broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransmissionType {
    #[default]
    Unicast,
    Broadcast,
}

/// A message that only carries a byte size. Useful for load tests and as a placeholder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizedMessage(pub usize);

impl Message for SizedMessage {
    fn byte_size(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, SizedMessage};

    #[derive(Clone, Debug)]
    struct Text(String);

    impl Message for Text {
        fn byte_size(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn boxed_messages_downcast_and_clone() {
        let boxed: Box<dyn Message> = Box::new(Text("hello".to_string()));
        let copy = boxed.clone();
        assert_eq!(copy.byte_size(), 5);
        assert_eq!(copy.downcast_ref::<Text>().map(|t| t.0.as_str()), Some("hello"));
        assert!(copy.downcast_ref::<SizedMessage>().is_none());
    }
}
