pub mod csv;
pub mod excel;
pub mod chart;
pub mod report;
mod raster;

use crate::cli::ExportFormat;
use crate::error::Result;
use shot_emotion_common::{ResultTable, UnknownLabelPolicy};
use std::path::{Path, PathBuf};

/// 出力先を拡張子に合わせて決める
///
/// ディレクトリ（または拡張子なし）なら `<title>.<ext>` を中に作り、
/// ファイルパスなら拡張子だけ差し替える。
fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.with_extension(extension)
    }
}

/// 結果テーブルを指定形式で保存し、書き出したパスを返す
pub fn export_results(
    table: &ResultTable,
    format: &ExportFormat,
    output: &Path,
    title: &str,
    policy: UnknownLabelPolicy,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Csv | ExportFormat::Both) {
        let path = output_path_for_format(output, title, "csv");
        println!("- CSVを保存中...");
        csv::write_csv(table, &path)?;
        println!("✔ CSV出力: {}", path.display());
        written.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_path_for_format(output, title, "xlsx");
        println!("- Excelを生成中...");
        excel::generate_excel(table, &path, title, policy)?;
        println!("✔ Excel出力: {}", path.display());
        written.push(path);
    }

    Ok(written)
}
