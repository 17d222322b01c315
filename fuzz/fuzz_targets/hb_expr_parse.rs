#![no_main]

use hb_expr::{Defs, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let mut defs = Defs::new();
    defs.insert("r".into(), "sqrt(x*x + y*y)".into());
    defs.insert("loop".into(), "loop + 1".into());

    if let Ok(expr) = parse(src, &defs) {
        // A label must reparse to the same tree.
        let again = parse(&expr.label(), &Defs::new()).expect("label does not reparse");
        assert_eq!(again, expr);
    }
});
