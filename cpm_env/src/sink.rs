//! Downstream consumer boundary for reconstructed objects.

/// Consumer of the object list reconstructed from an inbound message.
///
/// In a vehicle this is the local map / fusion pipeline; in tests it is a
/// channel or a counter. Publication is fire-and-forget: the station does
/// not wait for the consumer.
pub trait PerceptionSink<T>: Send + Sync + 'static {
    /// Delivers a freshly reconstructed object collection.
    fn publish(&self, objects: T);
}

/// Blanket impl so plain closures can act as sinks in tests and demos.
impl<T, F> PerceptionSink<T> for F
where
    F: Fn(T) + Send + Sync + 'static,
{
    fn publish(&self, objects: T) {
        self(objects)
    }
}
