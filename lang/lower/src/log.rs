use crate::driver::LocalDeclarationsLowering;
use hoist_syntax::*;
use std::fmt::Display;

impl LocalDeclarationsLowering<'_> {
    pub fn log_ugly<S, T>(&self, msg: S, item: T)
    where
        S: Display,
        T: for<'f> Ugly<'f, Formatter<'f>>,
    {
        let res = {
            let fmt = Formatter::new(self.program);
            item.ugly(&fmt)
        };
        ::log::trace!("[{}] {}", msg, res);
    }

    pub fn log_pretty<S, T>(&self, msg: S, item: T)
    where
        S: Display,
        T: for<'f> Pretty<'f, Formatter<'f>>,
    {
        let res = {
            let fmt = Formatter::new(self.program);
            Formatter::render(item.pretty(&fmt))
        };
        ::log::trace!("[{}]\n{}", msg, res);
    }
}
