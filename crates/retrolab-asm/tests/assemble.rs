use retrolab_asm::{assemble, preprocess::preprocess};

fn one_file(text: &str) -> Vec<(String, String)> {
    vec![("main.s".to_string(), text.to_string())]
}

#[test]
fn literal_byte_scenarios() {
    let cases: &[(&str, &[u8])] = &[
        ("nop", &[0x00]),
        ("pushb 32", &[0x50, 0x20]),
        ("pushb -2", &[0x50, 0x7E]),
        ("pushb 128", &[0x50, 0x8A, 0x80]),
        ("pushb 0x1234", &[0x50, 0x8B, 0x34, 0x12]),
        ("pushb [B + 12]", &[0x50, 0xC1, 0x0C]),
        ("mov A, 0x12", &[0x02, 0x90, 0x12]),
        ("jmp 0x1234", &[0x63, 0x34, 0x12]),
        (r#"db "AB\"CD""#, &[0x41, 0x42, 0x22, 0x43, 0x44]),
    ];
    for (src, expected) in cases {
        let out = assemble(&one_file(src));
        assert!(out.is_ok(), "{src} failed: {:?}", out.error);
        assert_eq!(out.binary, *expected, "mismatch for {src}");
    }
}

#[test]
fn preprocessor_orders_def_main_then_alphabetical() {
    let files = vec![
        ("bbb.s".to_string(), "text3".to_string()),
        ("aaa.s".to_string(), "text0".to_string()),
        ("main.s".to_string(), "text1\nxxx".to_string()),
        ("retrolab.def".to_string(), "text2".to_string()),
        ("data.bin".to_string(), "text4".to_string()),
    ];
    let expected = "[$retrolab.def$:1] text2\n\
                     [$main.s$:1] text1\n\
                     [$main.s$:2] xxx\n\
                     [$aaa.s$:1] text0\n\
                     [$bbb.s$:1] text3\n";
    assert_eq!(preprocess(&files), expected);
}

#[test]
fn negative_case_value_too_high() {
    let out = assemble(&one_file("pushb 0x123456"));
    assert!(!out.is_ok());
    let err = out.error.unwrap();
    assert!(err.message.to_lowercase().contains("too high"));
    assert_eq!(err.filename, "main.s");
    assert_eq!(err.line, 1);
}

#[test]
fn negative_case_duplicate_symbol() {
    let out = assemble(&one_file("xx = 3\nxx = 4"));
    assert!(!out.is_ok());
    assert!(out.binary.is_empty());
}

#[test]
fn negative_case_define_starts_with_dot() {
    let out = assemble(&one_file(".abc = 3"));
    assert!(!out.is_ok());
}

#[test]
fn debug_table_round_trips_pc_for_each_line() {
    let out = assemble(&one_file("nop\nnop\nnop"));
    assert!(out.is_ok());
    for line in 1..=3u32 {
        let pc = out.debug.find_pc("main.s", line).unwrap();
        assert_eq!(out.debug.source_of(pc), Some(("main.s", line)));
    }
}

#[test]
fn bss_reserves_zero_filled_gap() {
    let out = assemble(&one_file("db 1\nbss 3\ndb 2"));
    assert!(out.is_ok());
    assert_eq!(out.binary, vec![1, 0, 0, 0, 2]);
}

#[test]
fn org_restore_returns_to_saved_pc() {
    let out = assemble(&one_file("db 1\norg 0x10\ndb 2\norg restore\ndb 3"));
    assert!(out.is_ok());
    assert_eq!(out.binary[0], 1);
    assert_eq!(out.binary[0x10], 2);
    assert_eq!(out.binary[1], 3);
}

#[test]
fn org_restore_without_save_is_error() {
    let out = assemble(&one_file("org restore"));
    assert!(!out.is_ok());
}

#[test]
fn dw_emits_little_endian_words() {
    let out = assemble(&one_file("dw 0x1234, 0xABCD"));
    assert!(out.is_ok());
    assert_eq!(out.binary, vec![0x34, 0x12, 0xCD, 0xAB]);
}
