macro_rules! def_units {
    ($t: ident, $doc: literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        pub struct $t<T>(pub T);

        impl<T> $t<T> {
            pub fn into_inner(self) -> T {
                self.0
            }

            pub fn map<S>(self, mut f: impl FnMut(T) -> S) -> $t<S> {
                $t(f(self.0))
            }
        }
    };
}

def_units!(
    PixelUnits,
    "Denotes that the inner `T` is given in units of global (or frame-local) pixels."
);
def_units!(
    TileUnits,
    "Denotes that the inner `T` is given in (possibly fractional) units of tiles."
);
