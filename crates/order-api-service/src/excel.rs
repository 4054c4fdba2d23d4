//! 원고（手稿）Excel 批量解析
//!
//! 管理员把准备好的 원고 整理在 Excel 里批量上传，服务端解析出
//! 每行一条的内容条目。解析核心只操作内存中的单元格文本，
//! calamine 读取层是一层薄封装，规则本身可以不构造 xlsx 文件直接单测。

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use crate::error::{ApiError, Result};

/// 表头关键词：首行 B 列出现其一即认定为表头行，跳过不计入内容
const HEADER_KEYWORDS: [&str; 4] = ["원고", "내용", "제목", "content"];

/// 内容所在列（B 列）
const CONTENT_COLUMN: usize = 1;

/// 从 Excel 字节流解析 원고 列表
///
/// 按文件魔数自动识别容器格式，.xlsx 和旧版 .xls 都能打开。
/// 只读第一个工作表。文件损坏、无工作表、无有效内容都按
/// FileProcessingError（422）处理。
pub fn parse_manuscripts(bytes: &[u8]) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ApiError::FileProcessingError(format!("엑셀 파일을 열 수 없습니다: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ApiError::FileProcessingError("워크시트가 없습니다".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ApiError::FileProcessingError(format!("워크시트 읽기 실패: {}", e)))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    extract_manuscripts(&rows)
}

/// 单元格转文本（数字也按文本收录，원고에 숫자만 있는 경우 포함）
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            // 整数值去掉小数点尾巴
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        _ => String::new(),
    }
}

/// 从单元格文本矩阵中抽取 원고 内容
///
/// 规则：
/// - 内容取 B 列；
/// - 首行 B 列含表头关键词时视为表头，跳过；
/// - 空行跳过；
/// - 一条有效内容都没有时报错，而不是静默创建零条目。
pub fn extract_manuscripts(rows: &[Vec<String>]) -> Result<Vec<String>> {
    let mut manuscripts = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let cell = row.get(CONTENT_COLUMN).map(String::as_str).unwrap_or("");

        if idx == 0 && is_header(cell) {
            continue;
        }
        if cell.is_empty() {
            continue;
        }
        manuscripts.push(cell.to_string());
    }

    if manuscripts.is_empty() {
        return Err(ApiError::FileProcessingError(
            "원고 내용이 없습니다. B열에 원고를 입력해 주세요".to_string(),
        ));
    }

    Ok(manuscripts)
}

fn is_header(cell: &str) -> bool {
    let lowered = cell.to_lowercase();
    HEADER_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_extracts_column_b_skipping_header() {
        let input = rows(&[
            &["번호", "원고"],
            &["1", "강남 카페 추천 포스팅"],
            &["2", "분위기 좋은 카페 후기"],
        ]);
        let result = extract_manuscripts(&input).unwrap();
        assert_eq!(result, vec!["강남 카페 추천 포스팅", "분위기 좋은 카페 후기"]);
    }

    #[test]
    fn test_first_row_without_header_keyword_is_content() {
        let input = rows(&[&["1", "첫 번째 원고입니다"], &["2", "두 번째 원고입니다"]]);
        let result = extract_manuscripts(&input).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], "첫 번째 원고입니다");
    }

    #[test]
    fn test_header_keyword_variants() {
        for keyword in ["원고", "내용", "제목", "content", "Content"] {
            let input = rows(&[&["no", keyword], &["1", "본문"]]);
            let result = extract_manuscripts(&input).unwrap();
            assert_eq!(result, vec!["본문"], "keyword={keyword}");
        }
    }

    #[test]
    fn test_skips_empty_rows() {
        let input = rows(&[
            &["번호", "원고"],
            &["1", "유효한 원고"],
            &["2", ""],
            &[],
            &["4", "또 다른 원고"],
        ]);
        let result = extract_manuscripts(&input).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        // 빈 파일
        assert!(matches!(
            extract_manuscripts(&rows(&[])),
            Err(ApiError::FileProcessingError(_))
        ));
        // 표头만 있고 내용이 없는 파일
        assert!(matches!(
            extract_manuscripts(&rows(&[&["번호", "원고"]])),
            Err(ApiError::FileProcessingError(_))
        ));
        // B열이 전부 비어 있는 파일
        assert!(matches!(
            extract_manuscripts(&rows(&[&["1", ""], &["2", ""]])),
            Err(ApiError::FileProcessingError(_))
        ));
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        let err = parse_manuscripts(b"this is not an excel file").unwrap_err();
        assert!(matches!(err, ApiError::FileProcessingError(_)));

        // 旧版 .xls 的 CFB 魔数开头但内容残缺：走同一错误路径，不 panic
        let mut cfb_stub = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        cfb_stub.resize(512, 0);
        let err = parse_manuscripts(&cfb_stub).unwrap_err();
        assert!(matches!(err, ApiError::FileProcessingError(_)));
    }

    /// 真实 xlsx 容器经格式自动识别后完整解析
    #[test]
    fn test_parses_xlsx_container() {
        let bytes = include_bytes!("../tests/fixtures/manuscripts.xlsx");
        let result = parse_manuscripts(bytes).unwrap();
        assert_eq!(result, vec!["강남 카페 추천 포스팅", "분위기 좋은 카페 후기"]);
    }
}
