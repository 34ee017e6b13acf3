mod common;

use common::*;
use tablegen::prelude::*;

#[test_log::test]
fn test_sample_batch_matches_golden_csharp() {
    let batch = sample_batch();
    assert_eq!(
        batch.names(),
        vec!["DEDayOfWeek", "DESampleArray", "DESampleComplex", "DEContentsOpenTime"]
    );

    let sink = compile_all(&compiler(LanguageProfile::csharp(), 4), &batch);
    for name in ["DESampleArray", "DESampleComplex", "DEContentsOpenTime"] {
        let text = sink.get(name).unwrap();
        assert_eq!(normalize(text), golden(name), "{name} differs from golden output");
    }
}

#[test]
fn test_csharp_uses_crlf() {
    let sink = compile_all(&compiler(LanguageProfile::csharp(), 1), &sample_batch());
    let text = sink.get("DEContentsOpenTime").unwrap();
    assert!(text.starts_with("using System.Collections.Generic;\r\n\r\n"));
    assert!(text.ends_with("}\r\n"));
    assert!(!text.replace("\r\n", "").contains('\n'));
}

#[test]
fn test_declaration_order_is_post_order() {
    let compiler = compiler(LanguageProfile::csharp(), 1);
    let report = compiler.compile_batch(&sample_batch());

    let Some(SchemaOutcome::Emitted(unit)) = report.outcome("DESampleComplex") else {
        panic!("DESampleComplex was not emitted");
    };
    assert_eq!(
        unit.declaration_names(),
        vec![
            "DESampleComplex_Rewards_Condition",
            "DESampleComplex_Rewards_Messages",
            "DESampleComplex_Rewards",
            "DESampleComplex_Exp",
            "DESampleComplex",
        ]
    );
    let kinds: Vec<DeclarationKind> = unit.declarations().iter().map(|d| d.kind).collect();
    assert_eq!(kinds.last(), Some(&DeclarationKind::Class));
    assert!(kinds[..4].iter().all(|k| *k == DeclarationKind::Struct));
}

#[test]
fn test_array_helpers_precede_table() {
    let report = compiler(LanguageProfile::csharp(), 1).compile_batch(&sample_batch());
    let Some(SchemaOutcome::Emitted(unit)) = report.outcome("DESampleArray") else {
        panic!("DESampleArray was not emitted");
    };

    assert_eq!(
        unit.declaration_names(),
        vec![
            "DESampleArray_StructColArr",
            "DESampleArray_StructRowArr",
            "DESampleArray"
        ]
    );
    let helper = &unit.declarations()[0].text;
    assert_eq!(
        normalize(helper),
        "public class DESampleArray_StructColArr\n{\n    public string name;\n    public int value;\n}"
    );
}

#[test]
fn test_orientation_only_changes_notes() {
    let sink = compile_all(&compiler(LanguageProfile::rust(), 1), &sample_batch());
    let text = sink.get("DESampleArray").unwrap();

    assert!(text.contains("    /// 열방향 배열\n    /// Array orientation: column.\n    pub col_arr: Vec<i32>,"));
    assert!(text.contains("    /// 행방향 배열\n    /// Array orientation: row.\n    pub row_arr: Vec<i32>,"));

    let csharp = compile_all(&compiler(LanguageProfile::csharp(), 1), &sample_batch());
    let text = csharp.get("DESampleArray").unwrap();
    assert!(text.contains("public List<int> colArr;"));
    assert!(text.contains("public List<int> rowArr;"));
    assert!(!text.contains("orientation"));
}

#[test]
fn test_enum_unit_renders_members_in_order() {
    let sink = compile_all(&compiler(LanguageProfile::csharp(), 1), &sample_batch());
    let text = normalize(sink.get("DEDayOfWeek").unwrap());

    let expected = "\
using System.Collections.Generic;

/// <summary>
/// 요일
/// </summary>
public enum DEDayOfWeek
{
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}
";
    assert_eq!(text, expected);
}
