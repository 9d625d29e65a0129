/// Generates `add_*`/`remove_*` pairs on `Device` for the per-category buses in `Buses`.
macro_rules! listener_methods {
    ($($(#[$attr:meta])* $bus:ident: $tr:ident => $add:ident, $remove:ident;)*) => {
        impl Device {
            $(
            $(#[$attr])*
            ///
            /// Returns `false` if the listener is already registered. Only a weak reference is
            /// kept: dropping the listener unregisters it.
            pub fn $add<L: $tr + 'static>(&self, listener: &Arc<L>) -> bool {
                let listener: Arc<dyn $tr> = listener.clone();
                self.0.shared.buses.$bus.register(&listener)
            }

            /// Returns whether the listener was registered.
            pub fn $remove<L: $tr + 'static>(&self, listener: &Arc<L>) -> bool {
                let listener: Arc<dyn $tr> = listener.clone();
                self.0.shared.buses.$bus.unregister(&listener)
            }
            )*
        }
    };
}
