#![no_main]
use libfuzzer_sys::fuzz_target;

// The first line of the input is the pattern, the rest is the text it is
// matched against. The first byte after the pattern selects the flags.
fuzz_target!(|data: &str| {
    let Some((pattern, input)) = data.split_once('\n') else {
        return;
    };

    let flags = input.bytes().next().map_or(0, u32::from) & 0x1FF;

    let Ok(pattern) =
        regulus::compile(pattern, regulus::Flags::from_raw(flags))
    else {
        return;
    };

    let mut matcher = pattern.matcher(input);
    while matcher.find() {
        let end = matcher.end().unwrap();
        assert!(matcher.start().unwrap() <= end);
        assert!(end <= input.len());
    }

    let _ = pattern.split(input, 0);
});
