macro_rules! __if {
    ((false); $($body:tt)*) => {};
    (($($cond:tt)*); $($body:tt)*) => {
        $($body)*
    };
}

macro_rules! impl_iter {
    (
        on = $name:ident { $($params:tt)* } where { $($bounds:tt)* };
        inner = $inner:ident;
        item = { $($item:tt)* };
        map = $map:tt;
        clone = $clone:tt;
    ) => {
        impl<$($params)*> ::core::iter::Iterator for $name<$($params)*> where $($bounds)* {
            type Item = $($item)*;

            fn next(&mut self) -> Option<Self::Item> {
                self.nth(0)
            }

            fn nth(&mut self, n: usize) -> Option<Self::Item> {
                let inner = self.$inner.nth(n)?;
                ($map)(self, inner)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                self.$inner.size_hint()
            }
        }

        impl<$($params)*> ::core::iter::DoubleEndedIterator for $name<$($params)*> where $($bounds)* {
            fn next_back(&mut self) -> Option<Self::Item> {
                self.nth_back(0)
            }

            fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
                let inner = self.$inner.nth_back(n)?;
                ($map)(self, inner)
            }
        }

        impl<$($params)*> ::core::iter::FusedIterator for $name<$($params)*> where $($bounds)* {}

        impl<$($params)*> ::core::iter::ExactSizeIterator for $name<$($params)*> where $($bounds)* {}

        impl<$($params)*> ::core::fmt::Debug for $name<$($params)*> where $($bounds)* {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("remaining", &self.$inner.size_hint().0)
                    .finish()
            }
        }

        crate::util::__if! {
            ($clone);
            impl<$($params)*> ::core::clone::Clone for $name<$($params)*> where $($bounds)* {
                fn clone(&self) -> Self {
                    ($clone)(self)
                }
            }
        }
    };
}

/// Checks the list's structural invariants after a mutation in debug builds.
macro_rules! debug_invariants {
    ($list:expr) => {{
        #[cfg(debug_assertions)]
        $list.assert_invariants();
    }};
}

pub(crate) use __if;
pub(crate) use debug_invariants;
pub(crate) use impl_iter;
