// This module renders flat instructions as assembly text. The fixed operand
// region is driven entirely by the descriptor table: ids print 1-based with
// a % sigil, enum immediates resolve through their name tables, embedded
// strings decode from their packed words and print quoted, and the
// extended-instruction number resolves against the set imported for the call.
// The variable tail then follows the descriptor's tail grammar: memory and
// image masks print symbolically (with the alignment literal demanded when
// the Aligned bit is set), two-word wide constants print as one 64-bit
// value, decoration tails switch on the decoration kind, and entry-point
// interface lists print ids only. The printer is stateful just enough to
// remember which import id belongs to which extended set; everything else is
// a pure function of the instruction.

//! Descriptor-driven textual instruction printer.

use crate::core::error::{LegalizeError, LegalizeResult};
use crate::mc::lower::EXT_INST_SET_OPERAND;
use crate::mc::{McInst, McOperand};
use crate::spv::{
    ext_inst_name, opencl_has_rounding_mode_tail, strings, AccessQualifier, AddressingModel,
    BuiltIn, Capability, Decoration, Dim, EnumKind, ExecutionMode, ExecutionModel, ExtInstSet,
    FPFastMathMode, FPRoundingMode, FixedOp, FunctionControl, FunctionParameterAttribute,
    ImageFormat, ImageOperand, LinkageType, MemoryModel, MemoryOperand, Opcode, Scope,
    StorageClass, Tail,
};
use hashbrown::HashMap;

/// Symbolic name of an enum immediate, falling back to the raw value for
/// kinds or values outside the known tables.
fn enum_name(kind: EnumKind, v: u32) -> String {
    fn or_raw(name: Option<&'static str>, v: u32) -> String {
        name.map(str::to_string).unwrap_or_else(|| v.to_string())
    }
    match kind {
        EnumKind::StorageClass => or_raw(StorageClass::from_u32(v).map(StorageClass::name), v),
        EnumKind::ExecutionModel => {
            or_raw(ExecutionModel::from_u32(v).map(ExecutionModel::name), v)
        }
        EnumKind::AddressingModel => {
            or_raw(AddressingModel::from_u32(v).map(AddressingModel::name), v)
        }
        EnumKind::MemoryModel => or_raw(MemoryModel::from_u32(v).map(MemoryModel::name), v),
        EnumKind::ExecutionMode => or_raw(ExecutionMode::from_u32(v).map(ExecutionMode::name), v),
        EnumKind::Capability => or_raw(Capability::from_u32(v).map(Capability::name), v),
        EnumKind::Decoration => or_raw(Decoration::from_u32(v).map(Decoration::name), v),
        EnumKind::Dim => or_raw(Dim::from_u32(v).map(Dim::name), v),
        EnumKind::ImageFormat => or_raw(ImageFormat::from_u32(v).map(ImageFormat::name), v),
        EnumKind::FunctionControl => FunctionControl::symbolic(v),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Stateful printer; remembers which result ids name extended-set imports.
#[derive(Debug, Default)]
pub struct InstPrinter {
    imports: HashMap<u32, ExtInstSet>,
}

impl InstPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    fn shape_err(&self, mnemonic: &'static str, reason: impl Into<String>) -> LegalizeError {
        LegalizeError::UnsupportedOperandShape {
            mnemonic,
            reason: reason.into(),
        }
    }

    /// Decode the packed string starting at operand `start`. Returns the
    /// string and the index of the first operand past its words.
    fn string_at(&self, inst: &McInst, start: usize) -> (String, usize) {
        let mut words = Vec::new();
        let mut idx = start;
        while let Some(v) = inst.imm_at(idx) {
            idx += 1;
            let word = v as u32;
            words.push(word);
            if word.to_le_bytes().contains(&0) {
                break;
            }
        }
        (strings::decode_string(&words), idx)
    }

    fn push_plain(&self, out: &mut String, op: McOperand) {
        match op {
            McOperand::Id(v) => out.push_str(&format!(" %{}", v + 1)),
            McOperand::Imm(v) => out.push_str(&format!(" {v}")),
            McOperand::FpImm(v) => out.push_str(&format!(" {v:?}")),
        }
    }

    /// Render one instruction as assembly text.
    pub fn print_inst(&mut self, inst: &McInst) -> LegalizeResult<String> {
        let Some(desc) = inst.opcode.desc() else {
            return Err(self.shape_err(
                "<pseudo>",
                format!("{:?} has no printable form", inst.opcode),
            ));
        };

        let mut out = String::new();
        let mut idx = 0;
        if desc.has_def() {
            let def = inst
                .id_at(0)
                .ok_or_else(|| self.shape_err(desc.mnemonic, "missing result id"))?;
            out.push_str(&format!("%{} = ", def + 1));
            idx = 1;
        }
        out.push_str(desc.mnemonic);

        for &fixed in &desc.fixed[idx..] {
            match fixed {
                FixedOp::Def => {
                    return Err(self.shape_err(desc.mnemonic, "def outside operand 0"))
                }
                FixedOp::Id => {
                    let v = inst
                        .id_at(idx)
                        .ok_or_else(|| self.shape_err(desc.mnemonic, "expected id operand"))?;
                    out.push_str(&format!(" %{}", v + 1));
                    idx += 1;
                }
                FixedOp::Imm => {
                    let v = inst
                        .imm_at(idx)
                        .ok_or_else(|| self.shape_err(desc.mnemonic, "expected literal operand"))?;
                    out.push_str(&format!(" {v}"));
                    idx += 1;
                }
                FixedOp::Enum(kind) => {
                    let v = inst
                        .imm_at(idx)
                        .ok_or_else(|| self.shape_err(desc.mnemonic, "expected enum operand"))?;
                    out.push_str(&format!(" {}", enum_name(kind, v as u32)));
                    idx += 1;
                }
                FixedOp::Str => {
                    let (s, next) = self.string_at(inst, idx);
                    if next == idx {
                        return Err(self.shape_err(desc.mnemonic, "expected string words"));
                    }
                    out.push_str(&format!(" {}", quote(&s)));
                    idx = next;
                    // A debug-info form may carry further strings back to
                    // back; print each quoted on its own.
                    if desc.tail == Tail::StringDone {
                        while idx < inst.operands.len() {
                            let (s, next) = self.string_at(inst, idx);
                            if next == idx {
                                return Err(self
                                    .shape_err(desc.mnemonic, "non-literal word in string tail"));
                            }
                            out.push_str(&format!(" {}", quote(&s)));
                            idx = next;
                        }
                    }
                }
                FixedOp::ExtInstNum => {
                    let number = inst
                        .imm_at(idx)
                        .ok_or_else(|| self.shape_err(desc.mnemonic, "expected instruction number"))?;
                    let set = inst
                        .id_at(EXT_INST_SET_OPERAND)
                        .and_then(|id| self.imports.get(&id).copied());
                    match set.and_then(|s| ext_inst_name(s, number)) {
                        Some(name) => out.push_str(&format!(" {name}")),
                        None => out.push_str(&format!(" {number}")),
                    }
                    idx += 1;
                }
            }
        }

        self.print_tail(inst, desc.mnemonic, desc.tail, idx, &mut out)?;

        if inst.opcode == Opcode::OpExtInstImport {
            if let (Some(def), (name, _)) = (inst.id_at(0), self.string_at(inst, 1)) {
                if let Some(set) = ExtInstSet::from_name(&name) {
                    self.imports.insert(def, set);
                }
            }
        }
        Ok(out)
    }

    fn print_tail(
        &self,
        inst: &McInst,
        mnemonic: &'static str,
        tail: Tail,
        mut idx: usize,
        out: &mut String,
    ) -> LegalizeResult<()> {
        match tail {
            Tail::None | Tail::StringDone => {}
            Tail::Plain | Tail::Literals | Tail::Single => {
                for &op in &inst.operands[idx.min(inst.operands.len())..] {
                    self.push_plain(out, op);
                }
            }
            Tail::AccessQualifier => {
                if let Some(v) = inst.imm_at(idx) {
                    match AccessQualifier::from_u32(v as u32) {
                        Some(q) => out.push_str(&format!(" {}", q.name())),
                        None => out.push_str(&format!(" {v}")),
                    }
                }
            }
            Tail::IdsOnly => {
                while idx < inst.operands.len() {
                    if let Some(v) = inst.id_at(idx) {
                        out.push_str(&format!(" %{}", v + 1));
                    }
                    idx += 1;
                }
            }
            Tail::Memory => {
                if let Some(mask) = inst.imm_at(idx) {
                    out.push_str(&format!(" {}", MemoryOperand::symbolic(mask as u32)));
                    idx += 1;
                    for &op in &inst.operands[idx..] {
                        self.push_plain(out, op);
                    }
                }
            }
            Tail::MemoryGroups => {
                while idx < inst.operands.len() {
                    let mask = inst
                        .imm_at(idx)
                        .ok_or_else(|| self.shape_err(mnemonic, "expected memory-operand mask"))?;
                    out.push_str(&format!(" {}", MemoryOperand::symbolic(mask as u32)));
                    idx += 1;
                    if mask as u32 & MemoryOperand::Aligned != 0 {
                        let align = inst.imm_at(idx).ok_or_else(|| {
                            self.shape_err(mnemonic, "Aligned mask without alignment literal")
                        })?;
                        out.push_str(&format!(" {align}"));
                        idx += 1;
                    }
                }
            }
            Tail::Image => {
                if let Some(mask) = inst.imm_at(idx) {
                    out.push_str(&format!(" {}", ImageOperand::symbolic(mask as u32)));
                    idx += 1;
                    for &op in &inst.operands[idx..] {
                        self.push_plain(out, op);
                    }
                }
            }
            Tail::WideConstant => {
                let rest = &inst.operands[idx.min(inst.operands.len())..];
                match rest {
                    [McOperand::Imm(low), McOperand::Imm(high)] => {
                        let wide = (*low as u64 & 0xffff_ffff) | ((*high as u64) << 32);
                        out.push_str(&format!(" {wide}"));
                    }
                    _ => {
                        for &op in rest {
                            self.push_plain(out, op);
                        }
                    }
                }
            }
            Tail::Decorate => self.print_decorate_tail(inst, mnemonic, idx, out)?,
            Tail::ExtInst => self.print_ext_inst_tail(inst, idx, out),
        }
        Ok(())
    }

    /// Decoration tails: the decoration kind operand selects how the extra
    /// operands are spelled.
    fn print_decorate_tail(
        &self,
        inst: &McInst,
        mnemonic: &'static str,
        mut idx: usize,
        out: &mut String,
    ) -> LegalizeResult<()> {
        let dec = inst
            .imm_at(idx - 1)
            .and_then(|v| Decoration::from_u32(v as u32));
        match dec {
            Some(Decoration::BuiltIn) => {
                let v = inst
                    .imm_at(idx)
                    .ok_or_else(|| self.shape_err(mnemonic, "BuiltIn without a kind operand"))?;
                match BuiltIn::from_u32(v as u32) {
                    Some(b) => out.push_str(&format!(" {}", b.name())),
                    None => out.push_str(&format!(" {v}")),
                }
            }
            Some(Decoration::UniformId) => {
                if let Some(v) = inst.imm_at(idx) {
                    match Scope::from_u32(v as u32) {
                        Some(s) => out.push_str(&format!(" {}", s.name())),
                        None => out.push_str(&format!(" {v}")),
                    }
                }
            }
            Some(Decoration::FuncParamAttr) => {
                if let Some(v) = inst.imm_at(idx) {
                    match FunctionParameterAttribute::from_u32(v as u32) {
                        Some(a) => out.push_str(&format!(" {}", a.name())),
                        None => out.push_str(&format!(" {v}")),
                    }
                }
            }
            Some(Decoration::FPRoundingMode) => {
                if let Some(v) = inst.imm_at(idx) {
                    match FPRoundingMode::from_u32(v as u32) {
                        Some(m) => out.push_str(&format!(" {}", m.name())),
                        None => out.push_str(&format!(" {v}")),
                    }
                }
            }
            Some(Decoration::FPFastMathMode) => {
                if let Some(v) = inst.imm_at(idx) {
                    out.push_str(&format!(" {}", FPFastMathMode::symbolic(v as u32)));
                }
            }
            Some(Decoration::LinkageAttributes) => {
                let (name, next) = self.string_at(inst, idx);
                out.push_str(&format!(" {}", quote(&name)));
                idx = next;
                let v = inst.imm_at(idx).ok_or_else(|| {
                    self.shape_err(mnemonic, "LinkageAttributes without a linkage type")
                })?;
                match LinkageType::from_u32(v as u32) {
                    Some(l) => out.push_str(&format!(" {}", l.name())),
                    None => out.push_str(&format!(" {v}")),
                }
            }
            _ => {
                for &op in &inst.operands[idx.min(inst.operands.len())..] {
                    self.push_plain(out, op);
                }
            }
        }
        Ok(())
    }

    /// Extended-call argument tails. The half-store family of OpenCL.std
    /// carries a literal rounding mode as its final operand.
    fn print_ext_inst_tail(&self, inst: &McInst, idx: usize, out: &mut String) {
        let set = inst
            .id_at(EXT_INST_SET_OPERAND)
            .and_then(|id| self.imports.get(&id).copied());
        let number = inst.imm_at(EXT_INST_SET_OPERAND + 1);
        let rounding_tail = matches!(
            (set, number),
            (Some(ExtInstSet::OpenclStd), Some(n)) if opencl_has_rounding_mode_tail(n)
        );
        let last = inst.operands.len().saturating_sub(1);
        for (k, &op) in inst.operands.iter().enumerate().skip(idx) {
            if rounding_tail && k == last {
                if let McOperand::Imm(v) = op {
                    match FPRoundingMode::from_u32(v as u32) {
                        Some(m) => out.push_str(&format!(" {}", m.name())),
                        None => out.push_str(&format!(" {v}")),
                    }
                    continue;
                }
            }
            self.push_plain(out, op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(opcode: Opcode, operands: Vec<McOperand>) -> McInst {
        McInst::new(opcode).with_operands(operands)
    }

    #[test]
    fn ids_print_one_based() {
        let mut p = InstPrinter::new();
        let text = p
            .print_inst(&inst(
                Opcode::OpTypeVector,
                vec![McOperand::Id(4), McOperand::Id(2), McOperand::Imm(4)],
            ))
            .unwrap();
        assert_eq!(text, "%5 = OpTypeVector %3 4");
    }

    #[test]
    fn decorate_builtin_prints_symbolically() {
        let mut p = InstPrinter::new();
        let text = p
            .print_inst(&inst(
                Opcode::OpDecorate,
                vec![
                    McOperand::Id(7),
                    McOperand::Imm(Decoration::BuiltIn as i64),
                    McOperand::Imm(BuiltIn::GlobalInvocationId as i64),
                ],
            ))
            .unwrap();
        assert_eq!(text, "OpDecorate %8 BuiltIn GlobalInvocationId");
    }

    #[test]
    fn linkage_attributes_print_name_then_type() {
        let mut p = InstPrinter::new();
        let mut operands = vec![
            McOperand::Id(3),
            McOperand::Imm(Decoration::LinkageAttributes as i64),
        ];
        for word in strings::encode_string("foo") {
            operands.push(McOperand::Imm(word as i64));
        }
        operands.push(McOperand::Imm(LinkageType::Export as i64));
        let text = p.print_inst(&inst(Opcode::OpDecorate, operands)).unwrap();
        assert_eq!(text, "OpDecorate %4 LinkageAttributes \"foo\" Export");
    }

    #[test]
    fn wide_constant_combines_two_words() {
        let mut p = InstPrinter::new();
        let value: u64 = 0x1_0000_002a;
        let text = p
            .print_inst(&inst(
                Opcode::OpConstantI,
                vec![
                    McOperand::Id(5),
                    McOperand::Id(1),
                    McOperand::Imm((value & 0xffff_ffff) as i64),
                    McOperand::Imm((value >> 32) as i64),
                ],
            ))
            .unwrap();
        assert_eq!(text, format!("%6 = OpConstantI %2 {value}"));
    }

    #[test]
    fn aligned_copy_requires_alignment_literal() {
        let mut p = InstPrinter::new();
        let text = p
            .print_inst(&inst(
                Opcode::OpCopyMemory,
                vec![
                    McOperand::Id(1),
                    McOperand::Id(2),
                    McOperand::Imm(MemoryOperand::Aligned as i64),
                    McOperand::Imm(8),
                ],
            ))
            .unwrap();
        assert_eq!(text, "OpCopyMemory %2 %3 Aligned 8");

        let err = p
            .print_inst(&inst(
                Opcode::OpCopyMemory,
                vec![
                    McOperand::Id(1),
                    McOperand::Id(2),
                    McOperand::Imm(MemoryOperand::Aligned as i64),
                ],
            ))
            .unwrap_err();
        assert!(matches!(err, LegalizeError::UnsupportedOperandShape { .. }));
    }

    #[test]
    fn entry_point_interface_skips_string_words() {
        let mut p = InstPrinter::new();
        let mut operands = vec![
            McOperand::Imm(ExecutionModel::Kernel as i64),
            McOperand::Id(9),
        ];
        for word in strings::encode_string("main") {
            operands.push(McOperand::Imm(word as i64));
        }
        operands.push(McOperand::Id(12));
        let text = p.print_inst(&inst(Opcode::OpEntryPoint, operands)).unwrap();
        assert_eq!(text, "OpEntryPoint Kernel %10 \"main\" %13");
    }

    #[test]
    fn ext_inst_resolves_name_and_rounding_mode() {
        let mut p = InstPrinter::new();
        let mut import = vec![McOperand::Id(2)];
        for word in strings::encode_string("OpenCL.std") {
            import.push(McOperand::Imm(word as i64));
        }
        let text = p.print_inst(&inst(Opcode::OpExtInstImport, import)).unwrap();
        assert_eq!(text, "%3 = OpExtInstImport \"OpenCL.std\"");

        let text = p
            .print_inst(&inst(
                Opcode::OpExtInst,
                vec![
                    McOperand::Id(10),
                    McOperand::Id(4),
                    McOperand::Id(2),
                    McOperand::Imm(crate::spv::opencl_std::VSTORE_HALF_R),
                    McOperand::Id(11),
                    McOperand::Id(12),
                    McOperand::Imm(FPRoundingMode::RTZ as i64),
                ],
            ))
            .unwrap();
        assert_eq!(
            text,
            "%11 = OpExtInst %5 %3 vstore_half_r %12 %13 RTZ"
        );
    }

    #[test]
    fn pseudo_opcode_is_rejected() {
        let mut p = InstPrinter::new();
        let err = p.print_inst(&McInst::new(Opcode::AssignType)).unwrap_err();
        assert!(matches!(err, LegalizeError::UnsupportedOperandShape { .. }));
    }

    #[test]
    fn id_in_string_position_is_reported() {
        let mut p = InstPrinter::new();
        let err = p
            .print_inst(&inst(Opcode::OpName, vec![McOperand::Id(1), McOperand::Id(2)]))
            .unwrap_err();
        assert!(matches!(err, LegalizeError::UnsupportedOperandShape { .. }));
    }

    #[test]
    fn id_inside_a_string_tail_is_reported() {
        let mut p = InstPrinter::new();
        let mut operands = vec![McOperand::Id(1)];
        for word in strings::encode_string("tag") {
            operands.push(McOperand::Imm(word as i64));
        }
        operands.push(McOperand::Id(2));
        let err = p.print_inst(&inst(Opcode::OpName, operands)).unwrap_err();
        assert!(matches!(err, LegalizeError::UnsupportedOperandShape { .. }));
    }

    #[test]
    fn string_with_quote_is_escaped() {
        let mut p = InstPrinter::new();
        let mut operands = vec![McOperand::Id(0)];
        for word in strings::encode_string("say \"hi\"") {
            operands.push(McOperand::Imm(word as i64));
        }
        let text = p.print_inst(&inst(Opcode::OpName, operands)).unwrap();
        assert_eq!(text, "OpName %1 \"say \\\"hi\\\"\"");
    }
}
